//! Engine thresholds and runtime configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

/// Extensions the loader accepts, lowercase, without the dot.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Shorter-edge target for normalized images, in pixels.
pub const DEFAULT_TARGET_EDGE: u32 = 256;

/// Confidence at or above which the pair is concluded authentic.
pub const SIMILARITY_THRESHOLD_HIGH: u8 = 90;
/// Confidence below this is concluded fake; in between is suspicious.
pub const SIMILARITY_THRESHOLD_LOW: u8 = 70;

/// Dimension score at or above which the dimension reads normal.
pub const DIMENSION_THRESHOLD_NORMAL: u8 = 85;
/// Dimension score at or above this (but below normal) reads suspicious;
/// below it, abnormal. Independent of the conclusion thresholds.
pub const DIMENSION_THRESHOLD_SUSPICIOUS: u8 = 75;

/// Edge of the square thumbnail used by the mean-luminance hash.
pub const HASH_EDGE: u32 = 32;

/// Bounded symmetric perturbation applied by the baseline dimension scorers.
pub const DIMENSION_JITTER: i32 = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory against which relative image references resolve.
    pub uploads_root: PathBuf,
    pub target_edge: u32,
    /// Worker threads in the comparison pool.
    pub workers: usize,
    /// Wall-clock budget for a single image load; `None` disables the limit.
    pub load_timeout: Option<Duration>,
    /// Retention for completed task records; `None` keeps them for the
    /// process lifetime.
    pub task_ttl: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            uploads_root: PathBuf::from("uploads"),
            target_edge: DEFAULT_TARGET_EDGE,
            workers: num_cpus::get(),
            load_timeout: Some(Duration::from_secs(30)),
            task_ttl: None,
        }
    }
}

impl EngineConfig {
    /// Build the configuration from the environment, falling back to
    /// defaults field by field. A zero timeout or TTL disables the feature.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(dir) = env::var("UPLOADS_DIR") {
            config.uploads_root = PathBuf::from(dir);
        }
        config.target_edge = parse_var("IMAGE_TARGET_EDGE", config.target_edge);
        config.workers = parse_var("COMPARE_WORKERS", config.workers).max(1);
        if let Some(secs) = parse_set_var::<u64>("IMAGE_LOAD_TIMEOUT_SECS") {
            config.load_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = parse_set_var::<u64>("TASK_TTL_SECS") {
            config.task_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }
}

fn parse_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring unparseable {}={:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_set_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {}={:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.target_edge, 256);
        assert!(config.workers >= 1);
        assert_eq!(config.load_timeout, Some(Duration::from_secs(30)));
        assert!(config.task_ttl.is_none());
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        unsafe {
            env::set_var("UPLOADS_DIR", "/srv/photos");
            env::set_var("IMAGE_TARGET_EDGE", "128");
            env::set_var("COMPARE_WORKERS", "3");
            env::set_var("IMAGE_LOAD_TIMEOUT_SECS", "0");
            env::set_var("TASK_TTL_SECS", "600");
        }

        let config = EngineConfig::from_env();
        assert_eq!(config.uploads_root, PathBuf::from("/srv/photos"));
        assert_eq!(config.target_edge, 128);
        assert_eq!(config.workers, 3);
        assert!(config.load_timeout.is_none());
        assert_eq!(config.task_ttl, Some(Duration::from_secs(600)));

        unsafe {
            env::remove_var("UPLOADS_DIR");
            env::remove_var("IMAGE_TARGET_EDGE");
            env::remove_var("COMPARE_WORKERS");
            env::remove_var("IMAGE_LOAD_TIMEOUT_SECS");
            env::remove_var("TASK_TTL_SECS");
        }
    }

    #[test]
    #[serial]
    fn from_env_keeps_defaults_on_garbage() {
        unsafe {
            env::set_var("IMAGE_TARGET_EDGE", "huge");
            env::set_var("COMPARE_WORKERS", "0");
        }

        let config = EngineConfig::from_env();
        assert_eq!(config.target_edge, 256);
        // a zero worker pool would never drain; clamped up
        assert_eq!(config.workers, 1);

        unsafe {
            env::remove_var("IMAGE_TARGET_EDGE");
            env::remove_var("COMPARE_WORKERS");
        }
    }
}
