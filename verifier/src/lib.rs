//! Artifact return comparison engine.
//!
//! Authenticates returned museum artifacts by comparing a borrow photo
//! against a return photo: images are normalized to a canonical scale,
//! scored for pixel-level similarity and classified into a multi-dimension
//! forensic verdict. Comparisons run synchronously through
//! [`AiService::compare`] or asynchronously through a tracked worker pool
//! (`create_comparison_task` / `get_task_status` / `get_task_result`).

pub mod api;
pub mod compare;
pub mod config;
pub mod imaging;
pub mod tasks;
pub mod verdict;

pub use api::AiService;
pub use compare::ComparisonService;
pub use config::EngineConfig;
pub use shared::{
    ComparisonResult, Conclusion, Dimension, DimensionResult, DimensionStatus, TaskRecord,
    TaskStatus,
};
