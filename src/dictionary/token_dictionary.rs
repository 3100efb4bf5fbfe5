use std::{
    fs::{
        self,
        File,
    },
    io::{
        self,
        BufReader,
        BufWriter,
    },
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use liblzma::read::XzDecoder;
use log::info;
use reqwest::blocking::Client;
use tar::Archive;
use vibrato::{
    Dictionary,
    Tokenizer,
};
use zstd::stream::copy_decode;

use crate::{
    core::MorphRankError,
    persistence::get_app_data_dir,
};

fn get_tokenizer_dict_dir() -> PathBuf {
    get_app_data_dir().join("dictionaries").join("tokenizer")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictType {
    Unidic,
    Ipadic,
}

impl DictType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "unidic" => Some(DictType::Unidic),
            "ipadic" => Some(DictType::Ipadic),
            _ => None,
        }
    }

    fn url(&self) -> &str {
        match self {
            DictType::Unidic => {
                "https://github.com/daac-tools/vibrato/releases/download/v0.5.0/bccwj-suw+unidic-cwj-3_1_1.tar.xz"
            }
            DictType::Ipadic => {
                "https://github.com/daac-tools/vibrato/releases/download/v0.5.0/ipadic-mecab-2_7_0.tar.xz"
            }
        }
    }

    fn folder_name(&self) -> &str {
        match self {
            DictType::Unidic => "bccwj-suw+unidic-cwj-3_1_1",
            DictType::Ipadic => "ipadic-mecab-2_7_0",
        }
    }

    /// Feature column holding the dictionary (base) form.
    pub fn lemma_index(&self) -> usize {
        match self {
            DictType::Unidic => 10,
            DictType::Ipadic => 6,
        }
    }
}

fn download_to_file(url: &str, path: &Path) -> Result<(), MorphRankError> {
    let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
    let mut response = client.get(url).send()?.error_for_status()?;
    let mut writer = BufWriter::new(File::create(path)?);
    response.copy_to(&mut writer)?;
    Ok(())
}

/// Returns the path of the decompressed `system.dic`, downloading and unpacking
/// the release archive the first time.
pub fn ensure_dictionary(dict_type: &DictType) -> Result<PathBuf, MorphRankError> {
    let folder_name = dict_type.folder_name();
    let dict_dir = get_tokenizer_dict_dir();
    let extract_path = dict_dir.join(folder_name);
    let final_dic_path = extract_path.join("system.dic");

    if final_dic_path.exists() {
        info!("Tokenizer dictionary found at {:?}", final_dic_path);
        return Ok(final_dic_path);
    }

    fs::create_dir_all(&dict_dir)?;

    // Leftovers from an interrupted attempt are discarded.
    let download_path = dict_dir.join(format!("{}.tar.xz", folder_name));
    let tar_path = dict_dir.join(format!("{}.tar", folder_name));
    fs::remove_file(&download_path).ok();
    fs::remove_file(&tar_path).ok();
    fs::remove_dir_all(&extract_path).ok();

    info!("Downloading tokenizer dictionary from {}...", dict_type.url());
    download_to_file(dict_type.url(), &download_path)?;

    if download_path.metadata()?.len() == 0 {
        return Err(MorphRankError::Custom(format!(
            "Downloaded file {:?} is empty. Check your internet connection.",
            download_path
        )));
    }

    info!("Decompressing XZ to TAR...");
    let mut xz_decoder = XzDecoder::new(BufReader::new(File::open(&download_path)?));
    io::copy(&mut xz_decoder, &mut File::create(&tar_path)?)?;

    info!("Extracting TAR archive...");
    Archive::new(BufReader::new(File::open(&tar_path)?)).unpack(&extract_path)?;

    let zst_path = extract_path.join(folder_name).join("system.dic.zst");
    if !zst_path.exists() {
        return Err(MorphRankError::Custom(format!(
            "ZST file not found at {:?} after extraction.",
            zst_path
        )));
    }

    info!("Decompressing Zstandard to .dic...");
    copy_decode(
        BufReader::new(File::open(&zst_path)?),
        BufWriter::new(File::create(&final_dic_path)?),
    )?;

    fs::remove_dir_all(extract_path.join(folder_name))?;
    fs::remove_file(&download_path)?;
    fs::remove_file(&tar_path)?;

    info!("Tokenizer dictionary ready at {:?}", final_dic_path);
    Ok(final_dic_path)
}

/// Loads a dictionary file. Zstandard-compressed `.zst` files are decoded on the fly.
pub fn load_dictionary(path: &Path) -> Result<Dictionary, MorphRankError> {
    let reader = BufReader::new(File::open(path)?);
    let dict = if path.extension().is_some_and(|ext| ext == "zst") {
        Dictionary::read(zstd::Decoder::new(reader)?)?
    } else {
        Dictionary::read(reader)?
    };
    Ok(dict)
}

pub fn init_vibrato(dict_type: &DictType) -> Result<Tokenizer, MorphRankError> {
    let dict_path = ensure_dictionary(dict_type)?;
    let dict = load_dictionary(&dict_path)?;
    Ok(Tokenizer::new(dict))
}
