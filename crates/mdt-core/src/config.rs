use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides `ffmpeg_command` (may carry extra words).
pub const FFMPEG_ENV: &str = "FFMPEG";

/// Global configuration loaded from `~/.config/mdt/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdtConfig {
    /// yt-dlp executable used for downloads and metadata probing.
    pub ytdlp_bin: String,
    /// ffmpeg command line prefix, split on whitespace (e.g. "nice -n 10 ffmpeg").
    pub ffmpeg_command: String,
    /// yt-dlp output template for the intermediate (downloaded) file.
    pub output_template: String,
    /// How often `exit` re-checks for running jobs, in milliseconds.
    pub exit_poll_interval_ms: u64,
    /// Refresh period of `watch`, in milliseconds.
    pub watch_interval_ms: u64,
    /// Width of the job name column in `show`.
    pub name_display_width: usize,
}

impl Default for MdtConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_command: "ffmpeg".to_string(),
            output_template: "%(title)s-%(id)s.%(ext)s".to_string(),
            exit_poll_interval_ms: 250,
            watch_interval_ms: 1000,
            name_display_width: 70,
        }
    }
}

impl MdtConfig {
    pub fn exit_poll_interval(&self) -> Duration {
        Duration::from_millis(self.exit_poll_interval_ms.max(1))
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(1))
    }

    /// Apply overrides from the environment (currently only `FFMPEG`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(cmd) = std::env::var(FFMPEG_ENV) {
            if !cmd.trim().is_empty() {
                self.ffmpeg_command = cmd;
            }
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdt")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdtConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MdtConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MdtConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
