//! Chat-bot backends tried in order under one shared time budget.

use async_trait::async_trait;
use selina_core::{config::ServicesConfig, error::SelinaError};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::http::{get_json, Services};

/// Reply used when every backend failed or the budget ran out.
pub const AI_FALLBACK_REPLY: &str =
    "I'm having trouble connecting right now. Please try again later! 💞";

/// A single conversational endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn reply(&self, message: &str) -> Result<String, SelinaError>;
}

/// Ordered fallback over several [`ChatBackend`]s.
pub struct AiChain {
    backends: Vec<Box<dyn ChatBackend>>,
    budget: Duration,
}

impl AiChain {
    pub fn new(backends: Vec<Box<dyn ChatBackend>>, budget: Duration) -> Self {
        Self { backends, budget }
    }

    /// PopCat, then SimSimi, then Hercai.
    pub fn standard(client: &reqwest::Client, config: &ServicesConfig, bot_name: &str) -> Self {
        Self::new(
            vec![
                Box::new(PopCat {
                    client: client.clone(),
                    url: config.popcat_url.clone(),
                    bot_name: bot_name.to_string(),
                }),
                Box::new(SimSimi {
                    client: client.clone(),
                    url: config.simsimi_url.clone(),
                }),
                Box::new(Hercai {
                    client: client.clone(),
                    url: config.hercai_url.clone(),
                }),
            ],
            Duration::from_secs(config.ai_budget_secs),
        )
    }

    /// First non-empty answer wins. Never fails.
    pub async fn chat(&self, message: &str) -> String {
        let deadline = Instant::now() + self.budget;

        for backend in &self.backends {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("ai: budget exhausted before {}", backend.name());
                break;
            }

            match tokio::time::timeout(remaining, backend.reply(message)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    debug!("ai: answered by {}", backend.name());
                    return text;
                }
                Ok(Ok(_)) => debug!("ai: {} returned an empty reply", backend.name()),
                Ok(Err(e)) => warn!("ai: {} failed: {e}", backend.name()),
                Err(_) => {
                    warn!("ai: budget exhausted while waiting on {}", backend.name());
                    break;
                }
            }
        }

        AI_FALLBACK_REPLY.to_string()
    }
}

impl Services {
    pub async fn chat(&self, message: &str) -> String {
        self.ai.chat(message).await
    }
}

struct PopCat {
    client: reqwest::Client,
    url: String,
    bot_name: String,
}

#[derive(Deserialize)]
struct PopCatResponse {
    response: Option<String>,
}

#[async_trait]
impl ChatBackend for PopCat {
    fn name(&self) -> &str {
        "popcat"
    }

    async fn reply(&self, message: &str) -> Result<String, SelinaError> {
        let body = serde_json::json!({
            "msg": message,
            "owner": "User",
            "botname": self.bot_name,
        });
        let parsed: PopCatResponse =
            get_json(self.client.post(&self.url).json(&body), "popcat").await?;
        Ok(parsed.response.unwrap_or_default())
    }
}

struct SimSimi {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct SimSimiResponse {
    message: Option<String>,
}

#[async_trait]
impl ChatBackend for SimSimi {
    fn name(&self) -> &str {
        "simsimi"
    }

    async fn reply(&self, message: &str) -> Result<String, SelinaError> {
        let req = self
            .client
            .get(&self.url)
            .query(&[("text", message), ("lc", "en")]);
        let parsed: SimSimiResponse = get_json(req, "simsimi").await?;
        Ok(parsed.message.unwrap_or_default())
    }
}

struct Hercai {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct HercaiResponse {
    reply: Option<String>,
}

#[async_trait]
impl ChatBackend for Hercai {
    fn name(&self) -> &str {
        "hercai"
    }

    async fn reply(&self, message: &str) -> Result<String, SelinaError> {
        let req = self.client.get(&self.url).query(&[("question", message)]);
        let parsed: HercaiResponse = get_json(req, "hercai").await?;
        Ok(parsed.reply.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Script {
        Answer(&'static str),
        Fail,
        Hang,
    }

    struct Fake {
        script: Script,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatBackend for Fake {
        fn name(&self) -> &str {
            "fake"
        }

        async fn reply(&self, _message: &str) -> Result<String, SelinaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Answer(s) => Ok(s.to_string()),
                Script::Fail => Err(SelinaError::Service("down".into())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    fn fake(script: Script, calls: &Arc<AtomicUsize>) -> Box<dyn ChatBackend> {
        Box::new(Fake {
            script,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn test_first_failure_falls_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AiChain::new(
            vec![
                fake(Script::Fail, &calls),
                fake(Script::Answer("hello there"), &calls),
                fake(Script::Answer("unused"), &calls),
            ],
            Duration::from_secs(5),
        );
        assert_eq!(chain.chat("hi").await, "hello there");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AiChain::new(
            vec![
                fake(Script::Answer("   "), &calls),
                fake(Script::Answer("second"), &calls),
            ],
            Duration::from_secs(5),
        );
        assert_eq!(chain.chat("hi").await, "second");
    }

    #[tokio::test]
    async fn test_all_failing_returns_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AiChain::new(
            vec![fake(Script::Fail, &calls), fake(Script::Fail, &calls)],
            Duration::from_secs(5),
        );
        assert_eq!(chain.chat("hi").await, AI_FALLBACK_REPLY);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_elapsing_returns_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AiChain::new(
            vec![
                fake(Script::Hang, &calls),
                fake(Script::Answer("never reached"), &calls),
            ],
            Duration::from_secs(30),
        );
        assert_eq!(chain.chat("hi").await, AI_FALLBACK_REPLY);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
