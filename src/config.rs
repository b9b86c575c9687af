//! Runtime configuration read from the environment.
//!
//! Values are parsed at load time with fallback defaults. The binary loads a
//! `.env` file first (via `dotenvy`), so any of these can live there too.

use std::path::PathBuf;

use anyhow::Result;

use crate::GraphConfig;
use crate::layout::Canvas;

/// Default log level spec when `TAGLOOM_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Explicit database path. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    /// `flexi_logger` level spec, e.g. `info` or `tagloom=debug`.
    pub log_level: String,
    /// Canvas the graph is laid out on.
    pub canvas: Canvas,
    /// Node radius constants.
    pub graph: GraphConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            canvas: Canvas::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is unset or invalid.
    ///
    /// # Environment Variables
    ///
    /// - `TAGLOOM_DB` (path): database file
    /// - `TAGLOOM_LOG` (string, default `warn`): log level spec
    /// - `TAGLOOM_CANVAS_WIDTH` / `TAGLOOM_CANVAS_HEIGHT` (f64, default 800 x 600)
    /// - `TAGLOOM_BASE_RADIUS` (f64, default 20)
    /// - `TAGLOOM_RADIUS_PER_TAG` (f64, default 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("TAGLOOM_DB")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let log_level = std::env::var("TAGLOOM_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_level);

        let canvas = Canvas::new(
            positive_f64("TAGLOOM_CANVAS_WIDTH").unwrap_or(defaults.canvas.width),
            positive_f64("TAGLOOM_CANVAS_HEIGHT").unwrap_or(defaults.canvas.height),
        );

        let graph = GraphConfig {
            base_radius: positive_f64("TAGLOOM_BASE_RADIUS").unwrap_or(defaults.graph.base_radius),
            radius_per_tag: non_negative_f64("TAGLOOM_RADIUS_PER_TAG")
                .unwrap_or(defaults.graph.radius_per_tag),
        };

        Self {
            db_path,
            log_level,
            canvas,
            graph,
        }
    }

    /// Resolves the database path.
    ///
    /// Uses `TAGLOOM_DB` when set, otherwise `{data_dir}/tagloom/records.db` where
    /// `data_dir` is:
    /// - Linux: `~/.local/share`
    /// - macOS: `~/Library/Application Support`
    /// - Windows: `C:\Users\<user>\AppData\Roaming`
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the data directory
    /// cannot be determined.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

        Ok(data_dir.join("tagloom").join("records.db"))
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn positive_f64(name: &str) -> Option<f64> {
    env_f64(name).filter(|v| *v > 0.0)
}

fn non_negative_f64(name: &str) -> Option<f64> {
    env_f64(name).filter(|v| *v >= 0.0)
}
