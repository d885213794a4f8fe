//! Screenshot → widget records.
//!
//! Detection runs once per screenshot. Each surviving region is then cropped,
//! preprocessed, recognized and parsed on its own; a failure there only skips
//! that region.

use chrono::Local;
use image::{DynamicImage, GenericImageView};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::thread;

use crate::config::{get_config, DetectorConfig};
use crate::detect::{detect_widget_regions, WidgetRegion};
use crate::error::{PipelineError, RegionError};
use crate::extract::extract_fields;
use crate::ocr::{crop_region, read_region, TesseractEngine, TextRecognizer};
use crate::tables::ExtractionTables;
use crate::widget::{Category, ExtractedWidget, Trend};

/// Why a region produced no record.
#[derive(Debug)]
pub enum SkipReason {
    Failed(RegionError),
    /// Nothing recognizable: no title and no current value
    Noise,
}

/// Result of processing one region.
#[derive(Debug)]
pub enum RegionOutcome {
    Extracted(ExtractedWidget),
    Skipped {
        region: WidgetRegion,
        reason: SkipReason,
    },
}

/// Detection and extraction over a fixed recognizer and configuration.
pub struct WidgetPipeline<R> {
    recognizer: R,
    config: DetectorConfig,
    tables: &'static ExtractionTables,
}

impl<R: TextRecognizer> WidgetPipeline<R> {
    pub fn new(recognizer: R, config: DetectorConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            recognizer,
            config,
            tables: ExtractionTables::shared()?,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Rejects empty images and unusable engines before any region work.
    fn check_input(&self, image: &DynamicImage) -> Result<(), PipelineError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImage { width, height });
        }

        self.recognizer
            .check_available()
            .map_err(|e| PipelineError::EngineUnavailable(e.to_string()))
    }

    /// Deduplicated candidate regions, largest first.
    pub fn detect_regions(&self, image: &DynamicImage) -> Vec<WidgetRegion> {
        detect_widget_regions(&image.to_luma8(), &self.config)
    }

    /// Extracts every meaningful widget from a dashboard screenshot.
    ///
    /// `category_hint` is used for regions whose text matches no category
    /// keyword. No regions, or no meaningful ones, gives an empty list.
    pub fn process_screenshot(
        &self,
        image: &DynamicImage,
        category_hint: &str,
    ) -> Result<Vec<ExtractedWidget>, PipelineError> {
        self.check_input(image)?;

        let fallback = Category::from_hint(category_hint);
        let regions = self.detect_regions(image);
        let outcomes = self.run_regions(image, &regions, fallback);

        let mut widgets = Vec::new();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                RegionOutcome::Extracted(widget) => {
                    log::info!("Extracted widget {}: {}", i + 1, widget.widget_name);
                    widgets.push(widget);
                }
                RegionOutcome::Skipped {
                    region,
                    reason: SkipReason::Noise,
                } => {
                    log::debug!(
                        "Region {} at {},{} {}x{}: nothing recognizable",
                        i + 1,
                        region.x,
                        region.y,
                        region.width,
                        region.height
                    );
                }
                RegionOutcome::Skipped {
                    reason: SkipReason::Failed(e),
                    ..
                } => {
                    log::warn!("Error processing region {}: {}", i + 1, e);
                }
            }
        }

        log::info!("{} of {} regions produced widgets", widgets.len(), regions.len());
        Ok(widgets)
    }

    /// Crop → preprocess → recognize → extract for a single region.
    pub fn process_region(
        &self,
        image: &DynamicImage,
        region: &WidgetRegion,
        fallback: Category,
    ) -> RegionOutcome {
        match self.extract_region(image, region, fallback) {
            Ok(widget) if widget.is_meaningful() => RegionOutcome::Extracted(widget),
            Ok(_) => RegionOutcome::Skipped {
                region: *region,
                reason: SkipReason::Noise,
            },
            Err(e) => RegionOutcome::Skipped {
                region: *region,
                reason: SkipReason::Failed(e),
            },
        }
    }

    fn extract_region(
        &self,
        image: &DynamicImage,
        region: &WidgetRegion,
        fallback: Category,
    ) -> Result<ExtractedWidget, RegionError> {
        let crop = crop_region(image, region)?;
        let transcription = read_region(&self.recognizer, &crop, &self.config);
        if transcription.all_failed() {
            return Err(RegionError::RecognitionFailed {
                modes: transcription.modes_tried,
                message: transcription.failures.join("; "),
            });
        }

        let fields = extract_fields(&transcription.text, fallback, self.tables);
        Ok(ExtractedWidget {
            widget_name: fields.widget_name,
            category: fields.category,
            min_value: fields.values.min,
            max_value: fields.values.max,
            current_value: fields.values.current,
            trend: fields.trend,
            timestamp: fields.timestamp,
            comments: String::new(),
            raw_text: transcription.text,
            confidence: region.confidence,
            source_region: *region,
            extracted_at: Local::now(),
        })
    }

    /// Treats the whole screenshot as one widget.
    ///
    /// The category is taken from the hint rather than classified, and the
    /// record is returned even if it reads as noise. If recognition fails
    /// outright the record is named `Error` and the failure goes in `comments`.
    pub fn process_whole_image(
        &self,
        image: &DynamicImage,
        category_hint: &str,
    ) -> Result<ExtractedWidget, PipelineError> {
        self.check_input(image)?;

        let (width, height) = image.dimensions();
        let region = WidgetRegion::whole_image((width, height))
            .ok_or(PipelineError::InvalidImage { width, height })?;
        let category = Category::from_hint(category_hint);

        match self.extract_region(image, &region, category) {
            Ok(widget) => Ok(ExtractedWidget { category, ..widget }),
            Err(e) => {
                log::warn!("Whole-image extraction failed: {}", e);
                Ok(ExtractedWidget {
                    widget_name: "Error".to_string(),
                    category,
                    min_value: String::new(),
                    max_value: String::new(),
                    current_value: String::new(),
                    trend: Trend::Unknown,
                    timestamp: String::new(),
                    comments: format!("Processing error: {}", e),
                    raw_text: String::new(),
                    confidence: region.confidence,
                    source_region: region,
                    extracted_at: Local::now(),
                })
            }
        }
    }

    /// Processes regions in order, on worker threads if configured.
    fn run_regions(
        &self,
        image: &DynamicImage,
        regions: &[WidgetRegion],
        fallback: Category,
    ) -> Vec<RegionOutcome> {
        let workers = self.config.workers.min(regions.len());
        if workers <= 1 {
            return regions
                .iter()
                .map(|region| self.process_region(image, region, fallback))
                .collect();
        }

        log::debug!("Processing {} regions on {} workers", regions.len(), workers);

        let next = AtomicUsize::new(0);
        let (sender, receiver) = channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(region) = regions.get(i) else {
                            break;
                        };
                        let outcome = self.process_region(image, region, fallback);
                        if sender.send((i, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);

        let mut indexed: Vec<(usize, RegionOutcome)> = receiver.into_iter().collect();
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Runs the pipeline with the installed Tesseract and the global config.
pub fn process_screenshot(
    image: &DynamicImage,
    category_hint: &str,
) -> Result<Vec<ExtractedWidget>, PipelineError> {
    let config = get_config();
    let engine = TesseractEngine::locate(&config.language)
        .map_err(|e| PipelineError::EngineUnavailable(e.to_string()))?;
    WidgetPipeline::new(engine, config.clone())?.process_screenshot(image, category_hint)
}
