//! Wire-contract types exchanged between the comparison engine and its
//! consumers. Field names and enum string forms are part of the contract
//! the surrounding application depends on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The six forensic aspects scored independently for every comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
    Seal,
    Brushwork,
    Paper,
    Inscription,
    Composition,
    Watermark,
}

/// Per-dimension verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DimensionStatus {
    Normal,
    Suspicious,
    Abnormal,
}

/// Overall authenticity verdict for a compared photo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Conclusion {
    Authentic,
    Suspicious,
    Fake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Processing
    }
}

/// Result for a single forensic dimension.
///
/// `annotation_url` is always serialized, as an explicit `null` until
/// visualization annotations are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub status: DimensionStatus,
    pub score: u8,
    pub description: String,
    pub annotation_url: Option<String>,
}

/// The full verdict for one borrow/return photo pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub conclusion: Conclusion,
    pub confidence: u8,
    pub dimensions: HashMap<Dimension, DimensionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonResult {
    /// Recovered load-failure result: suspicious, zero confidence, no
    /// dimensions, error message attached.
    pub fn load_failure(message: impl Into<String>) -> Self {
        Self {
            conclusion: Conclusion::Suspicious,
            confidence: 0,
            dimensions: HashMap::new(),
            error: Some(message.into()),
        }
    }
}

/// A trackable comparison task, queryable for progress and result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ComparisonResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: TaskStatus::default(),
            progress: 0,
            current_step: "started".to_string(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_progress(&mut self, progress: u8, step: &str) {
        self.progress = progress.min(100);
        self.current_step = step.to_string();
        self.status = TaskStatus::Processing;
        self.updated_at = Utc::now();
    }

    pub fn set_result(&mut self, result: ComparisonResult) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.updated_at = Utc::now();
    }
}
