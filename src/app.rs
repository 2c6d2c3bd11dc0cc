//! Wires the store, integrator and scheduler together.

use anyhow::{Context, Result};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

use crate::config::StewardConfig;
use crate::integrations::{Platform, PlatformIntegrator};
use crate::memory::types::category;
use crate::memory::Facade;
use crate::scheduler::{Clock, Scheduler, SystemClock};

pub struct Steward {
    pub config: StewardConfig,
    pub facade: Arc<Facade>,
    pub integrator: Arc<PlatformIntegrator>,
    pub scheduler: Arc<Scheduler>,
}

impl Steward {
    /// Open the configured store. A store that cannot be opened is fatal.
    pub fn open(config: StewardConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let facade = Facade::open(&db_path, config.profile.clone())
            .with_context(|| format!("failed to open store at {}", db_path.display()))?;
        tracing::info!(db = %db_path.display(), "store ready");
        Ok(Self::with_facade(config, Arc::new(facade), Arc::new(SystemClock)))
    }

    pub fn with_facade(config: StewardConfig, facade: Arc<Facade>, clock: Arc<dyn Clock>) -> Self {
        let integrator = Arc::new(PlatformIntegrator::new(Arc::clone(&facade), &config));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&facade),
            Arc::clone(&integrator),
            config.scheduler.clone(),
            clock,
        ));
        Self {
            config,
            facade,
            integrator,
            scheduler,
        }
    }

    /// Configured default fan-out targets. Unknown names are skipped with a warning.
    pub fn default_platforms(&self) -> Vec<Platform> {
        self.config
            .integrations
            .default_platforms
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring default platform");
                    None
                }
            })
            .collect()
    }

    /// Register the default jobs and run the scheduler until `shutdown` resolves.
    pub async fn run_autonomous(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.scheduler.register_defaults()?;
        self.scheduler.run(shutdown).await
    }

    /// Build a daily report now and save it under `manual_update_<ts>`.
    pub fn manual_update(&self) -> Result<(String, String)> {
        let now = Utc::now();
        let report = self.facade.daily_report(now)?;
        let key = format!("manual_update_{}", now.format("%Y%m%d_%H%M%S"));
        self.facade.save(&key, &report, category::REPORTS)?;
        Ok((key, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserProfile;

    fn steward(config: StewardConfig) -> Steward {
        let facade = Arc::new(Facade::in_memory(UserProfile::default()).unwrap());
        Steward::with_facade(config, facade, Arc::new(SystemClock))
    }

    #[test]
    fn default_platforms_skip_unknown_names() {
        let mut config = StewardConfig::default();
        config.integrations.default_platforms =
            vec!["perplexity".into(), "github".into(), "deepagent".into()];
        assert_eq!(
            steward(config).default_platforms(),
            vec![Platform::Perplexity, Platform::DeepAgent]
        );
    }

    #[test]
    fn manual_update_is_saved_as_report() {
        let s = steward(StewardConfig::default());
        let (key, report) = s.manual_update().unwrap();
        assert!(key.starts_with("manual_update_"));
        let entry = s.facade.entry(&key).unwrap();
        assert_eq!(entry.category, category::REPORTS);
        assert_eq!(entry.value, serde_json::json!(report));
    }
}
