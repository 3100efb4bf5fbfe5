use std::{
    fs::File,
    io::BufReader,
    path::{
        Path,
        PathBuf,
    },
};

use log::{
    debug,
    info,
};

use crate::core::{
    tasks::ProgressReporter,
    MorphKey,
    MorphRankError,
};

pub fn find_known_morph_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(find_known_morph_files(&path));
            } else if path.is_file() {
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if ext.eq_ignore_ascii_case("csv") {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    files
}

/// Reads one `lemma,inflection,...` file. The header row is skipped.
pub fn read_known_morph_file(path: &Path) -> Result<Vec<MorphKey>, MorphRankError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(File::open(path)?));

    let mut morphs = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(lemma) = record.get(0) {
            let inflection = record.get(1).unwrap_or(lemma);
            morphs.push(MorphKey::new(lemma, inflection));
        }
    }
    Ok(morphs)
}

/// Every morph listed in the CSV files below `dir`. A missing directory yields nothing.
pub fn load_known_morphs(
    dir: &Path,
    progress: &ProgressReporter,
) -> Result<Vec<MorphKey>, MorphRankError> {
    let files = find_known_morph_files(dir);
    let mut morphs = Vec::new();

    for (index, file) in files.iter().enumerate() {
        progress.check_cancelled()?;

        let relative = file.strip_prefix(dir).unwrap_or(file);
        progress.report(
            format!("Importing known morphs from file: {}", relative.display()),
            index,
            files.len(),
        );

        let file_morphs = read_known_morph_file(file)?;
        debug!("Read {} known morphs from {}", file_morphs.len(), relative.display());
        morphs.extend(file_morphs);
    }

    info!("Imported {} known morphs from {} files", morphs.len(), files.len());
    Ok(morphs)
}
