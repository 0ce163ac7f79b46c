use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::sampler::SamplerSettings;
use crate::upload::UploadSettings;

/// Throughput sampler parameters (`[sampler]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Milliseconds between throughput reports.
    pub tick_interval_ms: u64,
    /// Number of per-interval buckets the rate is averaged over at start.
    pub ring_initial_slots: usize,
    /// Upper bound the bucket ring grows to, one slot per tick.
    pub ring_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            ring_initial_slots: 16,
            ring_capacity: 16,
        }
    }
}

impl SamplerConfig {
    pub fn settings(&self) -> SamplerSettings {
        SamplerSettings {
            interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            initial_slots: self.ring_initial_slots.max(1),
            capacity: self.ring_capacity.max(self.ring_initial_slots).max(1),
        }
    }
}

/// Job group parameters (`[jobs]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Buffered progress messages per job before the job blocks on reporting.
    pub progress_capacity: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            progress_capacity: 5,
        }
    }
}

/// Upload driver parameters (`[upload]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub user_agent: String,
    /// Bytes read from the body source per write through the sampler.
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("scanflow/", env!("CARGO_PKG_VERSION")).to_string(),
            chunk_size: 32 * 1024,
        }
    }
}

/// Global configuration loaded from `~/.config/scanflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanflowConfig {
    /// Release metadata server, `host[:port]`.
    #[serde(default)]
    pub remote: String,
    /// Archive upload server, `host:port`.
    #[serde(default)]
    pub dl_server: String,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl ScanflowConfig {
    /// Overrides the server addresses from `SCANFLOW_REMOTE` and
    /// `SCANFLOW_DLSERV` when those are set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 2] = [
            ("SCANFLOW_REMOTE", &mut self.remote),
            ("SCANFLOW_DLSERV", &mut self.dl_server),
        ];
        for (key, field) in fields {
            if let Some(v) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = v.trim().to_string();
            }
        }
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            user_agent: self.upload.user_agent.clone(),
            chunk_size: self.upload.chunk_size.max(1),
            sampler: self.sampler.settings(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scanflow")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
/// Environment overrides are applied on top.
pub fn load_or_init() -> Result<ScanflowConfig> {
    let path = config_path()?;
    let mut cfg = if !path.exists() {
        let default_cfg = ScanflowConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        default_cfg
    } else {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data)?
    };
    cfg.apply_env();
    Ok(cfg)
}
