//! Threshold classification and per-dimension scoring.

use std::collections::HashMap;

use image::RgbImage;
use lazy_static::lazy_static;
use rand::Rng;
use shared::{Conclusion, Dimension, DimensionResult, DimensionStatus};
use strum::IntoEnumIterator;

use crate::config::{
    DIMENSION_JITTER, DIMENSION_THRESHOLD_NORMAL, DIMENSION_THRESHOLD_SUSPICIOUS,
    SIMILARITY_THRESHOLD_HIGH, SIMILARITY_THRESHOLD_LOW,
};

/// Overall conclusion from the global confidence.
pub fn conclusion_for(confidence: u8) -> Conclusion {
    if confidence >= SIMILARITY_THRESHOLD_HIGH {
        Conclusion::Authentic
    } else if confidence >= SIMILARITY_THRESHOLD_LOW {
        Conclusion::Suspicious
    } else {
        Conclusion::Fake
    }
}

/// Per-dimension status from that dimension's own score. This threshold
/// family is independent of [`conclusion_for`].
pub fn status_for(score: u8) -> DimensionStatus {
    if score >= DIMENSION_THRESHOLD_NORMAL {
        DimensionStatus::Normal
    } else if score >= DIMENSION_THRESHOLD_SUSPICIOUS {
        DimensionStatus::Suspicious
    } else {
        DimensionStatus::Abnormal
    }
}

lazy_static! {
    // keyed by (dimension, score >= normal threshold)
    static ref DESCRIPTIONS: HashMap<(Dimension, bool), &'static str> = {
        let mut table = HashMap::new();
        table.insert((Dimension::Seal, true), "seal position and content are consistent");
        table.insert((Dimension::Seal, false), "seal shows discrepancies");
        table.insert((Dimension::Brushwork, true), "brushwork characteristics are consistent");
        table.insert((Dimension::Brushwork, false), "brushwork shows discrepancies");
        table.insert((Dimension::Paper, true), "paper texture is consistent");
        table.insert((Dimension::Paper, false), "paper texture shows discrepancies");
        table.insert((Dimension::Inscription, true), "inscription content is consistent");
        table.insert((Dimension::Inscription, false), "inscription content shows discrepancies");
        table.insert((Dimension::Composition, true), "overall composition is consistent");
        table.insert((Dimension::Composition, false), "composition shows discrepancies");
        table.insert((Dimension::Watermark, true), "security marks are consistent");
        table.insert((Dimension::Watermark, false), "security marks show discrepancies");
        table
    };
}

/// Canned description for a dimension at a given score.
pub fn describe(dimension: Dimension, score: u8) -> &'static str {
    DESCRIPTIONS[&(dimension, score >= DIMENSION_THRESHOLD_NORMAL)]
}

/// Everything a dimension scorer may inspect for one comparison.
pub struct ComparisonContext<'a> {
    pub borrow_photo: &'a RgbImage,
    pub return_photo: &'a RgbImage,
    pub global_score: u8,
}

/// One forensic aspect assessor.
///
/// Implementations may be swapped for real feature extractors (seal
/// position matching, brushwork texture analysis, ...) as long as the
/// output contract holds: fixed dimension key, thresholded status, a
/// description, no annotation yet.
pub trait DimensionScorer: Send + Sync {
    fn dimension(&self) -> Dimension;
    fn assess(&self, context: &ComparisonContext<'_>) -> DimensionResult;
}

/// Placeholder scorer until per-dimension extraction lands: perturbs the
/// global score by a bounded symmetric jitter and classifies the outcome.
pub struct BaselineScorer {
    dimension: Dimension,
}

impl BaselineScorer {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension }
    }
}

impl DimensionScorer for BaselineScorer {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn assess(&self, context: &ComparisonContext<'_>) -> DimensionResult {
        let jitter = rand::rng().random_range(-DIMENSION_JITTER..=DIMENSION_JITTER);
        let score = (context.global_score as i32 + jitter).clamp(0, 100) as u8;
        DimensionResult {
            status: status_for(score),
            score,
            description: describe(self.dimension, score).to_string(),
            annotation_url: None,
        }
    }
}

/// The default capability set: one baseline scorer per dimension.
pub fn default_scorers() -> Vec<Box<dyn DimensionScorer>> {
    Dimension::iter()
        .map(|dimension| Box::new(BaselineScorer::new(dimension)) as Box<dyn DimensionScorer>)
        .collect()
}
