use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::error::OcrError;

/// Layout assumption handed to the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    SingleBlock,
    SingleWord,
    RawLine,
    SparseText,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 4] = [
        LayoutMode::SingleBlock,
        LayoutMode::SingleWord,
        LayoutMode::RawLine,
        LayoutMode::SparseText,
    ];

    /// Tesseract page segmentation mode
    pub fn psm(&self) -> u8 {
        match self {
            LayoutMode::SingleBlock => 6,
            LayoutMode::SingleWord => 8,
            LayoutMode::RawLine => 13,
            LayoutMode::SparseText => 11,
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutMode::SingleBlock => "single block",
            LayoutMode::SingleWord => "single word",
            LayoutMode::RawLine => "raw line",
            LayoutMode::SparseText => "sparse text",
        };
        f.write_str(name)
    }
}

/// Represents a single word from OCR with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// An opaque text recognition engine.
pub trait TextRecognizer: Send + Sync {
    /// Fails if the engine cannot be invoked at all.
    fn check_available(&self) -> Result<(), OcrError> {
        Ok(())
    }

    /// Recognizes every word in `image` under one layout assumption.
    fn recognize(&self, image: &GrayImage, mode: LayoutMode) -> Result<Vec<OcrWord>, OcrError>;
}

/// Runs the Tesseract command-line tool with TSV output.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
}

impl TesseractEngine {
    pub fn new(
        executable: PathBuf,
        tessdata: Option<PathBuf>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            executable,
            tessdata,
            language: language.into(),
        }
    }

    /// Finds an installed Tesseract and a tessdata directory for `language`.
    ///
    /// A missing tessdata directory is not an error; Tesseract then falls back
    /// to its compiled-in default.
    pub fn locate(language: &str) -> Result<Self, OcrError> {
        let executable = find_tesseract_executable()?;
        let tessdata = find_tessdata_dir(language);
        if tessdata.is_none() {
            log::debug!("No tessdata for '{}' found, using Tesseract's default", language);
        }
        Ok(Self::new(executable, tessdata, language))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        cmd
    }
}

impl TextRecognizer for TesseractEngine {
    fn check_available(&self) -> Result<(), OcrError> {
        match self.command().arg("--version").output() {
            Ok(output) if output.status.success() => Ok(()),
            _ => Err(OcrError::EngineNotFound),
        }
    }

    fn recognize(&self, image: &GrayImage, mode: LayoutMode) -> Result<Vec<OcrWord>, OcrError> {
        // Save image to temporary file
        let temp_input = tempfile::Builder::new().suffix(".png").tempfile()?;
        image.save(temp_input.path())?;

        let output = self
            .command()
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(mode.psm().to_string())
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                mode,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_tsv_words(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses Tesseract TSV output into its word-level entries.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text
pub fn parse_tsv_words(tsv: &str) -> Result<Vec<OcrWord>, OcrError> {
    let mut lines = tsv.lines();
    match lines.next() {
        Some(header) if header.starts_with("level") => {}
        Some(other) => return Err(OcrError::Tsv(format!("unexpected header: {}", other))),
        None => return Ok(Vec::new()),
    }

    let mut words = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        if fields[0].trim() != "5" {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let confidence: f32 = fields[10]
            .trim()
            .parse()
            .map_err(|_| OcrError::Tsv(format!("bad confidence '{}'", fields[10])))?;

        words.push(OcrWord::new(text, confidence));
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_psm_codes() {
        assert_eq!(LayoutMode::SingleBlock.psm(), 6);
        assert_eq!(LayoutMode::SingleWord.psm(), 8);
        assert_eq!(LayoutMode::RawLine.psm(), 13);
        assert_eq!(LayoutMode::SparseText.psm(), 11);
    }

    #[test]
    fn test_parse_tsv_words() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t300\t200\t-1\t\n\
             4\t1\t1\t1\t1\t0\t10\t10\t120\t20\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t10\t40\t20\t96.5\tCPU\n\
             5\t1\t1\t1\t1\t2\t55\t10\t70\t20\t91.25\tUsage\n\
             5\t1\t1\t1\t2\t1\t10\t40\t50\t30\t88\t75%\n\
             5\t1\t1\t1\t2\t2\t70\t40\t5\t30\t12\t \n"
        );

        let words = parse_tsv_words(&tsv).unwrap();
        assert_eq!(
            words,
            vec![
                OcrWord::new("CPU", 96.5),
                OcrWord::new("Usage", 91.25),
                OcrWord::new("75%", 88.0),
            ]
        );
    }

    #[test]
    fn test_parse_tsv_empty_output() {
        assert!(parse_tsv_words("").unwrap().is_empty());
        assert!(parse_tsv_words(HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_parse_tsv_rejects_garbage() {
        assert!(parse_tsv_words("Error opening data file").is_err());

        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t0\t0\t1\t1\tabc\tword\n");
        assert!(parse_tsv_words(&tsv).is_err());
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let engine = TesseractEngine::new(
            PathBuf::from("/definitely/not/a/real/tesseract"),
            None,
            "eng",
        );
        assert!(matches!(engine.check_available(), Err(OcrError::EngineNotFound)));
    }
}
