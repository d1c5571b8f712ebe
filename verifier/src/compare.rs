//! The synchronous comparison pipeline: load, score, classify.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use image::RgbImage;
use log::{error, info};
use rand::Rng;
use shared::{ComparisonResult, Conclusion, Dimension, DimensionResult};
use strum::IntoEnumIterator;

use crate::config::EngineConfig;
use crate::imaging::loader::{self, ImageLoadError};
use crate::imaging::similarity;
use crate::verdict::{self, ComparisonContext, DimensionScorer};

/// Stateless comparison pipeline. Cloning is cheap; independent image pairs
/// may be compared concurrently from any number of threads.
#[derive(Clone)]
pub struct ComparisonService {
    config: Arc<EngineConfig>,
    scorers: Arc<Vec<Box<dyn DimensionScorer>>>,
}

impl ComparisonService {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_scorers(config, verdict::default_scorers())
    }

    /// Build with a custom capability set, one scorer per dimension.
    pub fn with_scorers(config: EngineConfig, scorers: Vec<Box<dyn DimensionScorer>>) -> Self {
        Self {
            config: Arc::new(config),
            scorers: Arc::new(scorers),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compare a borrow/return photo pair. Resource failures are recovered
    /// into an error-bearing result; this never propagates an error.
    pub fn compare(&self, image1: &str, image2: &str, use_mock: bool) -> ComparisonResult {
        self.compare_with_progress(image1, image2, use_mock, None)
    }

    /// Same pipeline, reporting coarse milestones through `progress`.
    pub fn compare_with_progress(
        &self,
        image1: &str,
        image2: &str,
        use_mock: bool,
        progress: Option<&dyn Fn(u8, &str)>,
    ) -> ComparisonResult {
        if use_mock {
            report(progress, 50, "generating mock verdict");
            return self.mock_result();
        }

        report(progress, 10, "loading images");
        let borrow_photo = match self.load_with_timeout(image1) {
            Ok(img) => img,
            Err(e) => return self.recover(image1, e),
        };
        let return_photo = match self.load_with_timeout(image2) {
            Ok(img) => img,
            Err(e) => return self.recover(image2, e),
        };

        report(progress, 55, "scoring similarity");
        let similarity_score = similarity::pixel_similarity(&borrow_photo, &return_photo);
        let confidence = similarity_score.round().clamp(0.0, 100.0) as u8;

        report(progress, 80, "classifying verdict");
        let conclusion = verdict::conclusion_for(confidence);
        let context = ComparisonContext {
            borrow_photo: &borrow_photo,
            return_photo: &return_photo,
            global_score: confidence,
        };
        let dimensions = self
            .scorers
            .iter()
            .map(|scorer| (scorer.dimension(), scorer.assess(&context)))
            .collect();

        info!("comparison finished: confidence={confidence} conclusion={conclusion}");
        ComparisonResult {
            conclusion,
            confidence,
            dimensions,
            error: None,
        }
    }

    fn recover(&self, reference: &str, error: ImageLoadError) -> ComparisonResult {
        error!("image load failed for {reference}: {error}");
        ComparisonResult::load_failure(format!("image load failed: {error}"))
    }

    /// Run the loader under the configured wall-clock budget. A timeout is
    /// indistinguishable from any other load failure for the caller.
    fn load_with_timeout(&self, reference: &str) -> Result<RgbImage, ImageLoadError> {
        let Some(timeout) = self.config.load_timeout else {
            return loader::load_image(reference, &self.config);
        };

        let (tx, rx) = mpsc::channel();
        let config = Arc::clone(&self.config);
        let owned = reference.to_string();
        thread::spawn(move || {
            // receiver may be gone if the timeout already fired
            let _ = tx.send(loader::load_image(&owned, &config));
        });
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(ImageLoadError::Timeout(timeout.as_secs())),
        }
    }

    /// Schema-identical synthetic result for development without photos.
    fn mock_result(&self) -> ComparisonResult {
        let mut rng = rand::rng();
        let conclusion = if rng.random_bool(0.7) {
            Conclusion::Authentic
        } else {
            Conclusion::Suspicious
        };
        let confidence = rng.random_range(70..=95);
        let dimensions = Dimension::iter()
            .map(|dimension| {
                let score: u8 = rng.random_range(70..=95);
                (
                    dimension,
                    DimensionResult {
                        status: verdict::status_for(score),
                        score,
                        description: "automated analysis result (detection model pending)"
                            .to_string(),
                        annotation_url: None,
                    },
                )
            })
            .collect();
        ComparisonResult {
            conclusion,
            confidence,
            dimensions,
            error: None,
        }
    }
}

fn report(progress: Option<&dyn Fn(u8, &str)>, percent: u8, step: &str) {
    if let Some(callback) = progress {
        callback(percent, step);
    }
}
