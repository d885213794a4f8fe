use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::OcrError;
use crate::paths::get_tesseract_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

/// Common install locations, checked after the app data dir and PATH.
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

fn runs(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable: `TESSERACT_PATH`, our local dir, PATH,
/// then common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf, OcrError> {
    if let Some(path) = std::env::var_os("TESSERACT_PATH") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
        log::warn!("TESSERACT_PATH points to {}, which does not exist", p.display());
    }

    let local_exe = get_tesseract_dir().join(TESSERACT_EXE);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    let on_path = PathBuf::from("tesseract");
    if runs(&on_path) {
        return Ok(on_path);
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or(OcrError::EngineNotFound)
}

/// Finds a tessdata directory holding `<language>.traineddata`.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if local_tessdata.join(&traineddata).exists() {
        return Some(local_tessdata);
    }

    // Check TESSDATA_PREFIX environment variable
    if let Some(prefix) = std::env::var_os("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    COMMON_TESSDATA
        .iter()
        .map(PathBuf::from)
        .find(|p| p.join(&traineddata).exists())
}

/// Ensures `<language>.traineddata` is available, downloading it into the
/// local tessdata dir if no installed copy is found. Returns the directory.
pub fn ensure_tessdata(language: &str) -> Result<PathBuf> {
    if let Some(dir) = find_tessdata_dir(language) {
        log::info!("tessdata for '{}' found at: {}", language, dir.display());
        return Ok(dir);
    }

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;
    download_tessdata(language, &tessdata_dir)?;
    Ok(tessdata_dir)
}

/// Downloads trained data for `language` from the tessdata repository.
fn download_tessdata(language: &str, tessdata_dir: &Path) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    let path = tessdata_dir.join(format!("{}.traineddata", language));

    log::info!("Downloading {}...", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "dashboard-screenshot")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&bytes)?;

    log::info!(
        "Downloaded {}.traineddata ({} bytes) to {}",
        language,
        bytes.len(),
        path.display()
    );

    Ok(())
}
