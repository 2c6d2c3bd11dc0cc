//! Project handoff export: a JSON context package written to disk for an
//! external development tool to pick up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::error::IntegrationError;
use super::integrator::PlatformIntegrator;
use crate::memory::types::category;

/// Project metadata read from the caller's project file. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HandoffProject {
    pub name: String,
    pub description: String,
    pub code: String,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandoffReceipt {
    pub path: PathBuf,
    pub filename: String,
    pub package_size: usize,
}

/// Keep file names to `[A-Za-z0-9_-]`.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned
    }
}

/// Create `stem.json`, or `stem_2.json`, `stem_3.json`... if taken.
async fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, tokio::fs::File), IntegrationError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| IntegrationError::Handoff {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut attempt = 1u32;
    loop {
        let filename = if attempt == 1 {
            format!("{stem}.json")
        } else {
            format!("{stem}_{attempt}.json")
        };
        let path = dir.join(filename);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(IntegrationError::Handoff { path, source }),
        }
    }
}

impl PlatformIntegrator {
    /// Assemble the handoff package for `project` at `now`.
    pub fn handoff_package(&self, project: &HandoffProject, instructions: &str, now: DateTime<Utc>) -> Value {
        let memory_context: serde_json::Map<String, Value> = self
            .facade()
            .recent_entries(self.memory_context_entries())
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();

        json!({
            "project_name": project.name,
            "description": project.description,
            "code_base": project.code,
            "requirements": project.requirements,
            "instructions": instructions,
            "user_preferences": self.facade().profile(),
            "memory_context": memory_context,
            "timestamp": now.to_rfc3339(),
            "handoff_type": "development_continuation",
        })
    }

    /// Write the package to a fresh file in the handoff directory and record it.
    pub async fn handoff(
        &self,
        project: &HandoffProject,
        instructions: &str,
    ) -> Result<HandoffReceipt, IntegrationError> {
        let now = Utc::now();
        let package = self.handoff_package(project, instructions, now);
        let bytes = serde_json::to_vec_pretty(&package).map_err(anyhow::Error::from)?;

        let stem = format!("handoff_{}_{}", sanitize(&project.name), now.format("%Y%m%d_%H%M%S"));
        let (path, mut file) = create_unique(self.handoff_dir(), &stem).await?;

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(source) = written {
            tracing::error!(path = %path.display(), error = %source, "handoff write failed");
            return Err(IntegrationError::Handoff { path, source });
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.facade()
            .save(&format!("handoff_{filename}"), &package, category::HANDOFFS)?;
        tracing::info!(file = %path.display(), bytes = bytes.len(), "handoff package written");

        Ok(HandoffReceipt {
            path,
            filename,
            package_size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_characters() {
        assert_eq!(sanitize("My App"), "My_App");
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize(""), "project");
    }

    #[tokio::test]
    async fn unique_names_get_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_unique(dir.path(), "handoff_x").await.unwrap();
        let (second, _) = create_unique(dir.path(), "handoff_x").await.unwrap();
        assert_eq!(first.file_name().unwrap(), "handoff_x.json");
        assert_eq!(second.file_name().unwrap(), "handoff_x_2.json");
    }
}
