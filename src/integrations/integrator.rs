//! Per-vendor credential registry, single queries, and concurrent fan-out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::error::IntegrationError;
use super::platform::{AuthHeader, Platform, QueryReply};
use crate::config::{IntegrationsConfig, StewardConfig};
use crate::memory::types::category;
use crate::memory::Facade;

/// Endpoint, credential and header style for one vendor.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: Platform,
    pub endpoint: String,
    pub credential: Option<String>,
    pub auth: AuthHeader,
    pub active: bool,
}

impl PlatformConfig {
    fn new(platform: Platform, endpoint: Option<&String>) -> Self {
        Self {
            platform,
            endpoint: endpoint
                .cloned()
                .unwrap_or_else(|| platform.default_endpoint().to_string()),
            credential: None,
            auth: platform.auth(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatus {
    pub configured: bool,
    pub active: bool,
    pub endpoint: String,
}

/// One slot per requested platform, keyed by platform.
#[derive(Debug)]
pub struct FanOut {
    pub prompt: String,
    pub results: BTreeMap<Platform, Result<QueryReply, IntegrationError>>,
    pub timestamp: DateTime<Utc>,
}

impl FanOut {
    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_ok()).count()
    }

    /// Successful replies merged under a per-platform heading.
    pub fn combined_text(&self) -> String {
        let mut text = String::from("Multi-Platform AI Response:\n\n");
        for reply in self.results.values().flatten() {
            text.push_str(&format!(
                "{} Response:\n{}\n\n",
                reply.platform.display_name(),
                reply.text
            ));
        }
        text
    }

    /// JSON view with errors rendered as `{"error": "..."}`.
    pub fn to_json(&self) -> Value {
        let results: serde_json::Map<String, Value> = self
            .results
            .iter()
            .map(|(platform, result)| {
                let slot = match result {
                    Ok(reply) => json!({"success": true, "text": reply.text, "usage": reply.usage}),
                    Err(e) => json!({"success": false, "error": e.to_string()}),
                };
                (platform.as_str().to_string(), slot)
            })
            .collect();
        json!({
            "prompt": self.prompt,
            "results": results,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

/// Outcome of [`PlatformIntegrator::ask`].
#[derive(Debug)]
pub struct Answer {
    pub text: String,
    pub fan_out: FanOut,
}

/// Everything needed to issue one request, detached from the registry lock.
struct PreparedCall {
    client: reqwest::Client,
    platform: Platform,
    endpoint: String,
    credential: String,
    auth: AuthHeader,
    system: String,
}

impl PreparedCall {
    async fn send(self, prompt: &str) -> Result<QueryReply, IntegrationError> {
        let platform = self.platform;
        let body = platform.build_payload(&self.system, prompt);
        let request = self.auth.apply(self.client.post(&self.endpoint), &self.credential);

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|source| IntegrationError::Http { platform, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntegrationError::Status {
                platform,
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| IntegrationError::MalformedResponse {
                platform,
                detail: e.to_string(),
            })?;

        platform.parse_reply(&body)
    }
}

pub struct PlatformIntegrator {
    facade: Arc<Facade>,
    client: reqwest::Client,
    platforms: RwLock<BTreeMap<Platform, PlatformConfig>>,
    handoff_dir: PathBuf,
    memory_context_entries: usize,
}

impl PlatformIntegrator {
    /// Build the registry and restore any credentials persisted earlier.
    pub fn new(facade: Arc<Facade>, config: &StewardConfig) -> Self {
        Self::with_settings(facade, &config.integrations, config.resolved_handoff_dir())
    }

    pub fn with_settings(
        facade: Arc<Facade>,
        settings: &IntegrationsConfig,
        handoff_dir: PathBuf,
    ) -> Self {
        let mut platforms = BTreeMap::new();
        for platform in Platform::ALL {
            let endpoint = match platform {
                Platform::Perplexity => settings.perplexity_endpoint.as_ref(),
                Platform::AbacusAi => settings.abacus_endpoint.as_ref(),
                Platform::DeepAgent => settings.deepagent_endpoint.as_ref(),
            };
            let mut cfg = PlatformConfig::new(platform, endpoint);
            if let Some(Value::String(key)) = facade.get(&platform.credential_key()) {
                tracing::debug!(platform = %platform, "restored credential");
                cfg.credential = Some(key);
            }
            platforms.insert(platform, cfg);
        }

        Self {
            facade,
            client: reqwest::Client::new(),
            platforms: RwLock::new(platforms),
            handoff_dir,
            memory_context_entries: settings.memory_context_entries,
        }
    }

    pub(crate) fn facade(&self) -> &Facade {
        &self.facade
    }

    pub(crate) fn handoff_dir(&self) -> &PathBuf {
        &self.handoff_dir
    }

    pub(crate) fn memory_context_entries(&self) -> usize {
        self.memory_context_entries
    }

    fn registry(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<Platform, PlatformConfig>>, IntegrationError>
    {
        self.platforms
            .read()
            .map_err(|_| IntegrationError::Store(anyhow::anyhow!("platform registry lock poisoned")))
    }

    /// Set the credential for `name` and persist it. Unknown names are rejected.
    pub fn configure(&self, name: &str, credential: &str) -> Result<Platform, IntegrationError> {
        let platform: Platform = name.parse()?;

        let endpoint = {
            let mut platforms = self.platforms.write().map_err(|_| {
                IntegrationError::Store(anyhow::anyhow!("platform registry lock poisoned"))
            })?;
            let cfg = platforms
                .entry(platform)
                .or_insert_with(|| PlatformConfig::new(platform, None));
            cfg.credential = Some(credential.to_string());
            cfg.endpoint.clone()
        };

        self.facade
            .save(&platform.credential_key(), credential, category::CREDENTIALS)?;
        self.facade
            .record_integration(platform.as_str(), &endpoint, "configured", None)?;

        tracing::info!(platform = %platform, "credential configured");
        Ok(platform)
    }

    pub fn set_active(&self, platform: Platform, active: bool) -> Result<(), IntegrationError> {
        let mut platforms = self.platforms.write().map_err(|_| {
            IntegrationError::Store(anyhow::anyhow!("platform registry lock poisoned"))
        })?;
        if let Some(cfg) = platforms.get_mut(&platform) {
            cfg.active = active;
        }
        Ok(())
    }

    pub fn platform_config(&self, platform: Platform) -> Option<PlatformConfig> {
        self.registry().ok()?.get(&platform).cloned()
    }

    fn system_prompt(&self, context: &str) -> String {
        let profile = self.facade.profile();
        let mut system = format!(
            "You are {}'s personal AI assistant. Location: {}. Work: {}. Interests: {}. Tone: {}.",
            profile.name,
            profile.location,
            profile.work.join(", "),
            profile.interests.join(", "),
            profile.tone,
        );
        if !context.is_empty() {
            system.push_str(" Context: ");
            system.push_str(context);
        }
        system
    }

    fn prepare(&self, platform: Platform, context: &str) -> Result<PreparedCall, IntegrationError> {
        let registry = self.registry()?;
        let cfg = registry
            .get(&platform)
            .ok_or(IntegrationError::MissingCredential(platform))?;
        let credential = cfg
            .credential
            .clone()
            .ok_or(IntegrationError::MissingCredential(platform))?;

        Ok(PreparedCall {
            client: self.client.clone(),
            platform,
            endpoint: cfg.endpoint.clone(),
            credential,
            auth: cfg.auth,
            system: self.system_prompt(context),
        })
    }

    /// One request to one vendor. No retry.
    pub async fn query(
        &self,
        platform: Platform,
        prompt: &str,
        context: &str,
    ) -> Result<QueryReply, IntegrationError> {
        let call = self.prepare(platform, context)?;
        let result = call.send(prompt).await;
        if let Err(e) = &result {
            tracing::warn!(platform = %platform, error = %e, "query failed");
        }
        result
    }

    /// Query every listed platform concurrently. Each platform gets exactly
    /// one slot; a failing or panicking call only affects its own slot.
    pub async fn fan_out(&self, prompt: &str, platforms: &[Platform]) -> FanOut {
        let mut calls = Vec::new();
        for &platform in platforms {
            if calls.iter().any(|(p, _)| *p == platform) {
                continue;
            }
            let prepared = self.prepare(platform, "");
            let prompt = prompt.to_string();
            let handle = tokio::spawn(async move {
                match prepared {
                    Ok(call) => call.send(&prompt).await,
                    Err(e) => Err(e),
                }
            });
            calls.push((platform, handle));
        }

        let joined = futures::future::join_all(calls.into_iter().map(|(platform, handle)| async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(IntegrationError::TaskFailed {
                    platform,
                    detail: e.to_string(),
                }),
            };
            if let Err(e) = &result {
                tracing::warn!(platform = %platform, error = %e, "fan-out slot failed");
            }
            (platform, result)
        }))
        .await;

        FanOut {
            prompt: prompt.to_string(),
            results: joined.into_iter().collect(),
            timestamp: Utc::now(),
        }
    }

    /// Fan out, merge the successful replies, and log the exchange as a
    /// learning event scored by the fraction of platforms that answered.
    pub async fn ask(&self, prompt: &str, platforms: &[Platform]) -> Result<Answer, IntegrationError> {
        let fan_out = self.fan_out(prompt, platforms).await;
        let text = fan_out.combined_text();
        let score = if fan_out.results.is_empty() {
            0.0
        } else {
            fan_out.success_count() as f64 / fan_out.results.len() as f64
        };

        self.facade.record_learning_event(prompt, &text, score)?;
        tracing::info!(
            answered = fan_out.success_count(),
            requested = fan_out.results.len(),
            "multi-platform query complete"
        );
        Ok(Answer { text, fan_out })
    }

    pub fn status(&self) -> BTreeMap<Platform, PlatformStatus> {
        self.registry()
            .map(|registry| {
                registry
                    .values()
                    .map(|cfg| {
                        (
                            cfg.platform,
                            PlatformStatus {
                                configured: cfg.credential.is_some(),
                                active: cfg.active,
                                endpoint: cfg.endpoint.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mark every active, configured platform online. No outbound call is made.
    pub fn health_check(&self, now: DateTime<Utc>) -> Result<Vec<Platform>, IntegrationError> {
        let online: Vec<(Platform, String)> = self
            .registry()?
            .values()
            .filter(|cfg| cfg.active && cfg.credential.is_some())
            .map(|cfg| (cfg.platform, cfg.endpoint.clone()))
            .collect();

        for (platform, endpoint) in &online {
            self.facade
                .record_integration(platform.as_str(), endpoint, "online", Some(now))?;
        }
        tracing::debug!(online = online.len(), "platform health check");
        Ok(online.into_iter().map(|(p, _)| p).collect())
    }

    /// Persist an assistant space configuration derived from the profile.
    pub fn space_config(
        &self,
        name: &str,
        personality: &str,
        purpose: &str,
    ) -> Result<Value, IntegrationError> {
        let profile = self.facade.profile();
        let config = json!({
            "name": name,
            "personality": personality,
            "purpose": purpose,
            "owner": profile.name,
            "created": Utc::now().to_rfc3339(),
            "preferences": {
                "tone": profile.tone,
                "code_limit": profile.code_limit,
                "location_context": profile.location,
            },
            "memory_access": true,
            "learning_enabled": true,
        });
        self.facade
            .save(&format!("space_config_{name}"), &config, category::SPACES)?;
        Ok(config)
    }
}
