//! The closed set of vendors and their fixed wire shapes.
//!
//! Each [`Platform`] knows its default endpoint, how the credential goes
//! into the request headers, the request body it sends, and where the reply
//! text lives in the response. Adding a vendor means adding a variant.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::IntegrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "perplexity")]
    Perplexity,
    #[serde(rename = "abacus")]
    AbacusAi,
    #[serde(rename = "deepagent")]
    DeepAgent,
}

/// How the credential is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<header>: <key>`
    ApiKey(&'static str),
}

impl AuthHeader {
    pub fn apply(&self, request: reqwest::RequestBuilder, credential: &str) -> reqwest::RequestBuilder {
        match self {
            Self::Bearer => request.bearer_auth(credential),
            Self::ApiKey(header) => request.header(*header, credential),
        }
    }
}

/// Text and usage metadata from one successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReply {
    pub platform: Platform,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::Perplexity, Self::AbacusAi, Self::DeepAgent];

    /// Configuration name, as typed on the command line and used in store keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perplexity => "perplexity",
            Self::AbacusAi => "abacus",
            Self::DeepAgent => "deepagent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Perplexity => "Perplexity",
            Self::AbacusAi => "Abacus.AI",
            Self::DeepAgent => "DeepAgent",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Perplexity => "https://api.perplexity.ai/chat/completions",
            Self::AbacusAi => "https://routellm.abacus.ai/v1/chat/completions",
            Self::DeepAgent => "https://api.deepagent.ai/v1/completions",
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            Self::Perplexity => "llama-3.1-sonar-large-128k-online",
            Self::AbacusAi => "deepseek-r1",
            Self::DeepAgent => "deepagent-v1",
        }
    }

    pub fn auth(&self) -> AuthHeader {
        match self {
            Self::Perplexity | Self::AbacusAi => AuthHeader::Bearer,
            Self::DeepAgent => AuthHeader::ApiKey("X-API-Key"),
        }
    }

    /// Memory key the credential is persisted under.
    pub fn credential_key(&self) -> String {
        format!("api_key_{}", self.as_str())
    }

    /// Request body for `prompt`, with `system` as the assistant instructions.
    pub fn build_payload(&self, system: &str, prompt: &str) -> Value {
        match self {
            Self::Perplexity => json!({
                "model": self.model(),
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": prompt},
                ],
                "max_tokens": 2000,
                "temperature": 0.7,
            }),
            Self::AbacusAi => json!({
                "model": self.model(),
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": prompt},
                ],
                "stream": false,
            }),
            Self::DeepAgent => json!({
                "model": self.model(),
                "prompt": format!("{system}\n\n{prompt}"),
                "max_tokens": 2000,
            }),
        }
    }

    /// Pull the reply text out of a response body.
    pub fn parse_reply(&self, body: &Value) -> Result<QueryReply, IntegrationError> {
        let chat = body.pointer("/choices/0/message/content").and_then(Value::as_str);
        let text = match self {
            Self::DeepAgent => chat.or_else(|| body.pointer("/choices/0/text").and_then(Value::as_str)),
            Self::Perplexity | Self::AbacusAi => chat,
        };

        let text = text.ok_or_else(|| IntegrationError::MalformedResponse {
            platform: *self,
            detail: "missing choices[0].message.content".into(),
        })?;

        Ok(QueryReply {
            platform: *self,
            text: text.to_string(),
            usage: body.get("usage").cloned(),
        })
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Platform {
    type Err = IntegrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perplexity" => Ok(Self::Perplexity),
            "abacus" | "abacus.ai" | "abacusai" => Ok(Self::AbacusAi),
            "deepagent" => Ok(Self::DeepAgent),
            _ => Err(IntegrationError::UnknownPlatform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("perplexity".parse::<Platform>().unwrap(), Platform::Perplexity);
        assert_eq!("Abacus".parse::<Platform>().unwrap(), Platform::AbacusAi);
        assert_eq!("deepagent".parse::<Platform>().unwrap(), Platform::DeepAgent);
        assert!(matches!(
            "github".parse::<Platform>(),
            Err(IntegrationError::UnknownPlatform(name)) if name == "github"
        ));
    }

    #[test]
    fn names_round_trip() {
        for p in Platform::ALL {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
            assert_eq!(serde_json::to_value(p).unwrap(), json!(p.as_str()));
        }
    }

    #[test]
    fn perplexity_payload_shape() {
        let body = Platform::Perplexity.build_payload("be brief", "hi");
        assert_eq!(body["model"], "llama-3.1-sonar-large-128k-online");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn parses_chat_reply_with_usage() {
        let body = json!({
            "choices": [{"message": {"content": "hello"}}],
            "usage": {"total_tokens": 12}
        });
        let reply = Platform::Perplexity.parse_reply(&body).unwrap();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.usage, Some(json!({"total_tokens": 12})));
    }

    #[test]
    fn deepagent_accepts_completion_text() {
        let body = json!({"choices": [{"text": "done"}]});
        assert_eq!(Platform::DeepAgent.parse_reply(&body).unwrap().text, "done");
        assert!(Platform::AbacusAi.parse_reply(&body).is_err());
    }

    #[test]
    fn malformed_reply_is_tagged() {
        let err = Platform::AbacusAi.parse_reply(&json!({"error": "quota"})).unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::MalformedResponse { platform: Platform::AbacusAi, .. }
        ));
    }
}
