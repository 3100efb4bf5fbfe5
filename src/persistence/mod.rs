use std::{
    fs::{
        self,
        File,
    },
    io::{
        BufReader,
        BufWriter,
        Read,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
};

use log::{
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::MorphRankError;

const APP_NAME: &str = "morphrank";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, file_path: &Path) -> Result<(), MorphRankError> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(file_path, json)?;
    info!("Data saved to: {}", file_path.display());
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(
    file_path: &Path,
) -> Result<T, MorphRankError> {
    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    info!("Data loaded from: {}", file_path.display());
    Ok(data)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(file_path: &Path) -> T {
    match load_json::<T>(file_path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to load {}: {}. Using defaults.", file_path.display(), e);
            T::default()
        }
    }
}

/// Writes a whole snapshot, replacing whatever the file held before.
pub fn save_snapshot<T: Serialize>(data: &T, file_path: &Path) -> Result<(), MorphRankError> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let encoded = bincode::serde::encode_to_vec(data, bincode::config::standard())?;

    // Readers must never observe a partially written snapshot.
    let tmp_path = file_path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&encoded)?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp_path, file_path)?;
    Ok(())
}

pub fn load_snapshot<T: for<'de> Deserialize<'de>>(
    file_path: &Path,
) -> Result<Option<T>, MorphRankError> {
    if !file_path.exists() {
        return Ok(None);
    }

    let mut reader = BufReader::new(File::open(file_path)?);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    let (data, _): (T, usize) =
        bincode::serde::decode_from_slice(&buffer, bincode::config::standard())?;
    Ok(Some(data))
}
