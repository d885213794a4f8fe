use image::GrayImage;

use super::engine::{LayoutMode, OcrWord, TextRecognizer};

/// The best reading of a region across all tried layout modes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcription {
    /// Kept tokens joined by single spaces. Empty if nothing was read.
    pub text: String,
    /// Mode that produced `text`, if any did
    pub mode: Option<LayoutMode>,
    /// Mean confidence of the kept tokens (0-100)
    pub mean_confidence: f32,
    pub tokens: usize,
    pub modes_tried: usize,
    /// One message per mode whose engine call failed
    pub failures: Vec<String>,
}

impl Transcription {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True if modes were tried and the engine failed on every one of them.
    pub fn all_failed(&self) -> bool {
        self.modes_tried > 0 && self.failures.len() == self.modes_tried
    }
}

/// Runs every mode in `modes` and keeps the reading with the highest mean
/// token confidence.
///
/// Tokens at or below `confidence_floor`, or with empty text, are discarded
/// before averaging. A mode that errors or keeps no tokens counts as no
/// result. Ties go to the mode tried first.
pub fn best_transcription<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    image: &GrayImage,
    modes: &[LayoutMode],
    confidence_floor: f32,
) -> Transcription {
    let mut best = Transcription::default();
    let mut failures = Vec::new();

    for &mode in modes {
        let words = match recognizer.recognize(image, mode) {
            Ok(words) => words,
            Err(e) => {
                log::debug!("Recognition in {} mode failed: {}", mode, e);
                failures.push(e.to_string());
                continue;
            }
        };

        let kept: Vec<&OcrWord> = words
            .iter()
            .filter(|w| w.confidence > confidence_floor && !w.text.trim().is_empty())
            .collect();
        if kept.is_empty() {
            continue;
        }

        let mean = kept.iter().map(|w| w.confidence).sum::<f32>() / kept.len() as f32;
        log::debug!("{} mode: {} tokens, {:.1} mean confidence", mode, kept.len(), mean);
        if best.mode.is_none() || mean > best.mean_confidence {
            best = Transcription {
                text: kept.iter().map(|w| w.text.trim()).collect::<Vec<_>>().join(" "),
                mode: Some(mode),
                mean_confidence: mean,
                tokens: kept.len(),
                ..Transcription::default()
            };
        }
    }

    best.modes_tried = modes.len();
    best.failures = failures;

    if let Some(mode) = best.mode {
        log::debug!(
            "Best reading from {} mode ({} tokens, {:.1} mean): '{}'",
            mode,
            best.tokens,
            best.mean_confidence,
            best.text
        );
    }

    best
}
