use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StewardConfig {
    pub general: GeneralConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
    pub integrations: IntegrationsConfig,
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub handoff_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock time of the daily report, `HH:MM`.
    pub daily_report_time: String,
    pub repo_check_hours: u32,
    pub learning_analysis_hours: u32,
    /// Day name for the weekly cleanup job, e.g. `sunday`.
    pub cleanup_day: String,
    pub cleanup_time: String,
    pub improvement_hours: u32,
    pub question_interval_hours: u32,
    pub health_check_minutes: u32,
    /// Upper bound on a single coordinator sleep, so wall-clock jumps are noticed.
    pub max_idle_secs: u64,
    pub max_concurrent_jobs: usize,
    pub job_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub perplexity_endpoint: Option<String>,
    pub abacus_endpoint: Option<String>,
    pub deepagent_endpoint: Option<String>,
    /// Platforms queried by `ask` when none are named.
    pub default_platforms: Vec<String>,
    /// Number of recent memory entries bundled into a handoff.
    pub memory_context_entries: usize,
}

/// Static description of the person the assistant works for.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub location: String,
    pub vehicle: String,
    pub work: Vec<String>,
    pub interests: Vec<String>,
    pub tone: String,
    pub code_limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_steward_dir()
            .join("steward.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            handoff_dir: ".".into(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_report_time: "09:00".into(),
            repo_check_hours: 6,
            learning_analysis_hours: 3,
            cleanup_day: "sunday".into(),
            cleanup_time: "02:00".into(),
            improvement_hours: 12,
            question_interval_hours: 6,
            health_check_minutes: 10,
            max_idle_secs: 60,
            max_concurrent_jobs: 2,
            job_timeout_secs: 300,
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            perplexity_endpoint: None,
            abacus_endpoint: None,
            deepagent_endpoint: None,
            default_platforms: vec!["perplexity".into(), "abacus".into()],
            memory_context_entries: 10,
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Owner".into(),
            location: String::new(),
            vehicle: String::new(),
            work: vec![
                "Uber".into(),
                "Lyft".into(),
                "Spark".into(),
                "DoorDash".into(),
            ],
            interests: vec![
                "AI Development".into(),
                "Car Mods".into(),
                "Tech Gadgets".into(),
                "Gaming".into(),
                "Self-Defense".into(),
            ],
            tone: "snarky_sardonic_expert".into(),
            code_limit: 4000,
        }
    }
}

/// Returns `~/.steward/`
pub fn default_steward_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".steward")
}

/// Returns the default config file path: `~/.steward/config.toml`
pub fn default_config_path() -> PathBuf {
    default_steward_dir().join("config.toml")
}

impl StewardConfig {
    /// Load from a specific path, then apply env var overrides. A missing file
    /// yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            Self::from_toml(&contents)?
        } else {
            Self::from_toml("")?
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides (STEWARD_DB, STEWARD_HANDOFF_DIR, STEWARD_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STEWARD_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("STEWARD_HANDOFF_DIR") {
            self.storage.handoff_dir = val;
        }
        if let Ok(val) = std::env::var("STEWARD_LOG_LEVEL") {
            self.general.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_handoff_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.handoff_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
