use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use ollama_rs::generation::parameters::TimeUnit;
use openai::{Credentials, chat::*};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tokio::time::sleep;

use log::{debug, error, info, warn};

/// Models tend to wrap JSON in markdown fences even when told not to.
fn strip_code_fences(s: &str) -> &str {
    let mut trimmed = s.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        trimmed = stripped;
    } else if let Some(stripped) = trimmed.strip_prefix("```") {
        trimmed = stripped;
    }
    if let Some(stripped) = trimmed.strip_suffix("```") {
        trimmed = stripped;
    }
    trimmed.trim()
}

type MockFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

enum LlmBackend {
    OpenAi {
        model: String,
        api_key: Option<String>,
    },
    Ollama {
        model: String,
    },
    Mock {
        responder: MockFn,
    },
}

pub struct LlmInterface {
    backend: LlmBackend,
}

static OPENAI_CREDS: OnceCell<Credentials> = OnceCell::const_new();
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

static OLLAMA_CLIENT: OnceCell<Arc<ollama_rs::Ollama>> = OnceCell::const_new();
const OLLAMA_DEFAULT_MODEL: &str = "llama3.2:3b";

impl LlmInterface {
    pub async fn new_openai(api_key: Option<String>, model: Option<String>) -> Result<Self> {
        let model = model.unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string());
        info!("LlmInterface::new_openai selected model={}", model);
        Ok(Self {
            backend: LlmBackend::OpenAi { model, api_key },
        })
    }

    pub async fn new_ollama(model: Option<String>) -> Result<Self> {
        let model = model.unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string());
        info!("LlmInterface::new_ollama selected model={}", model);
        Ok(Self {
            backend: LlmBackend::Ollama { model },
        })
    }

    pub fn new_mock_fn(f: impl Fn(&str, &str) -> String + Send + Sync + 'static) -> Self {
        debug!("LlmInterface::new_mock_fn creating mock backend");
        Self {
            backend: LlmBackend::Mock {
                responder: Arc::new(f),
            },
        }
    }

    pub fn new_mock_map(map: HashMap<String, String>) -> Self {
        debug!(
            "LlmInterface::new_mock_map creating mock map backend with {} entries",
            map.len()
        );
        let m = Arc::new(map);
        Self::new_mock_fn(move |system, user| {
            let key = format!("{}\n--\n{}", system, user);
            match m.get(&key) {
                Some(v) => v.clone(),
                None => "".to_string(),
            }
        })
    }

    async fn get_openai_creds(api_key: &Option<String>) -> Result<Credentials> {
        debug!(
            "LlmInterface::get_openai_creds called; api_key provided={}",
            api_key.is_some()
        );
        Ok(OPENAI_CREDS
            .get_or_init(|| async {
                match api_key {
                    Some(key) => Credentials::new(key, ""),
                    None => Credentials::from_env(),
                }
            })
            .await
            .clone())
    }

    async fn get_ollama_client() -> Result<Arc<ollama_rs::Ollama>> {
        Ok(OLLAMA_CLIENT
            .get_or_init(|| async { Arc::new(ollama_rs::Ollama::default()) })
            .await
            .clone())
    }

    pub async fn call(&self, system: &str, user: &str) -> Result<String> {
        debug!(
            "LlmInterface::call invoked backend={}",
            match &self.backend {
                LlmBackend::OpenAi { model, .. } => format!("openai({})", model),
                LlmBackend::Ollama { model } => format!("ollama({})", model),
                LlmBackend::Mock { .. } => "mock".to_string(),
            }
        );

        match &self.backend {
            LlmBackend::OpenAi { model, api_key } => {
                let creds = Self::get_openai_creds(api_key).await?;
                let messages = vec![
                    ChatCompletionMessage {
                        role: ChatCompletionMessageRole::System,
                        content: Some(system.to_string()),
                        name: None,
                        function_call: None,
                        tool_call_id: None,
                        tool_calls: None,
                    },
                    ChatCompletionMessage {
                        role: ChatCompletionMessageRole::User,
                        content: Some(user.to_string()),
                        name: None,
                        function_call: None,
                        tool_call_id: None,
                        tool_calls: None,
                    },
                ];
                let result_completion = ChatCompletion::builder(model, messages)
                    .temperature(0.3)
                    .credentials(creds.clone())
                    .create()
                    .await
                    .map_err(|e| {
                        error!("OpenAI ChatCompletion.create() failed: {}", e);
                        e
                    })?;
                let result_message = result_completion
                    .choices
                    .first()
                    .ok_or_else(|| anyhow!("OpenAI returned no choices"))?
                    .message
                    .clone();
                let content = result_message
                    .content
                    .unwrap_or_else(|| "".to_string())
                    .trim()
                    .to_string();
                debug!("OpenAI response length={}", content.len());
                Ok(content)
            }
            LlmBackend::Ollama { model } => {
                debug!("Ollama call using model={}", model);
                let client = Self::get_ollama_client().await?;
                let options = ollama_rs::models::ModelOptions::default().temperature(0.3);
                let res = client
                    .generate(
                        ollama_rs::generation::completion::request::GenerationRequest::new(
                            model.clone(),
                            user.to_string(),
                        )
                        .options(options)
                        .system(system.to_string())
                        .keep_alive(ollama_rs::generation::parameters::KeepAlive::Until {
                            time: 30,
                            unit: TimeUnit::Minutes,
                        }),
                    )
                    .await
                    .map_err(|e| {
                        error!("Ollama generate failed: {}", e);
                        e
                    })?;
                debug!("Ollama response length={}", res.response.len());
                Ok(res.response.trim().to_string())
            }
            LlmBackend::Mock { responder } => {
                let r = responder(system, user);
                debug!("Mock response length={}", r.len());
                Ok(r.trim().to_string())
            }
        }
    }

    /// Call and deserialize the reply as JSON, tolerating markdown fences.
    /// Parse failures carry the offending payload so bad model output is
    /// debuggable from the error alone.
    pub async fn call_json<T>(&self, system: &str, user: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.call(system, user).await?;
        debug!("call_json raw LLM output len={}", raw.len());
        let stripped = strip_code_fences(&raw);
        let parsed: T = serde_json::from_str(stripped).map_err(|e| {
            error!("Cannot parse LLM JSON output: {} -- error: {}", stripped, e);
            anyhow!("Cannot parse LLM JSON output: {}\nError: {}", stripped, e)
        })?;
        Ok(parsed)
    }

    /// `call_json` with exponential backoff. Retries both transport errors
    /// and unparseable model output; the last error is returned once the
    /// attempts are spent.
    pub async fn call_json_with_retry<T>(
        &self,
        system: &str,
        user: &str,
        max_attempts: usize,
        base_delay: Duration,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if max_attempts == 0 {
            return Err(anyhow!("max_attempts must be >= 1"));
        }
        let mut attempt: usize = 0;
        loop {
            attempt += 1;
            match self.call_json(system, user).await {
                Ok(parsed) => {
                    debug!("call_json_with_retry succeeded on attempt={}", attempt);
                    return Ok(parsed);
                }
                Err(e) => {
                    warn!("call_json failed on attempt {}: {}", attempt, e);
                    if attempt >= max_attempts {
                        error!("call_json_with_retry exhausted attempts={}", attempt);
                        return Err(e);
                    }
                    let delay = backoff_delay(attempt, base_delay);
                    debug!(
                        "call_json_with_retry sleeping {:?} before next attempt",
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

fn backoff_delay(attempt: usize, base_delay: Duration) -> Duration {
    let cap_shift = ((attempt - 1) as u32).min(20);
    let exp = 1u128 << cap_shift;
    let delay_ms = base_delay.as_millis().saturating_mul(exp);
    let jitter = ((attempt as u64).wrapping_mul(37) % 100) as u128;
    let total_ms = delay_ms.saturating_add(jitter);
    if total_ms > u64::MAX as u128 {
        Duration::from_millis(u64::MAX)
    } else {
        Duration::from_millis(total_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Reply {
        answer: String,
    }

    #[tokio::test]
    async fn call_json_strips_fences() {
        let llm =
            LlmInterface::new_mock_fn(|_s, _u| "```json\n{\"answer\": \"ok\"}\n```".to_string());
        let reply: Reply = llm.call_json("system", "user").await.unwrap();
        assert_eq!(reply.answer, "ok");
    }

    #[tokio::test]
    async fn call_json_reports_bad_payload() {
        let llm = LlmInterface::new_mock_fn(|_s, _u| "not json at all".to_string());
        let err = llm.call_json::<Reply>("system", "user").await.unwrap_err();
        assert!(err.to_string().contains("not json at all"));
    }

    #[tokio::test]
    async fn mock_map_resolves_by_prompt_pair() {
        let mut map = HashMap::new();
        map.insert("sys\n--\nusr".to_string(), "hit".to_string());
        let llm = LlmInterface::new_mock_map(map);
        assert_eq!(llm.call("sys", "usr").await.unwrap(), "hit");
        assert_eq!(llm.call("sys", "other").await.unwrap(), "");
    }

    #[tokio::test]
    async fn retry_rejects_zero_attempts() {
        let llm = LlmInterface::new_mock_fn(|_s, _u| "{}".to_string());
        assert!(
            llm.call_json_with_retry::<Reply>("s", "u", 0, Duration::from_millis(1))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn retry_recovers_from_flaky_model_output() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let llm = LlmInterface::new_mock_fn(move |_s, _u| {
            match seen.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => "not json at all".to_string(),
                _ => "{\"answer\": \"ok\"}".to_string(),
            }
        });

        let reply: Reply = llm
            .call_json_with_retry("system", "user", 3, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(reply.answer, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_surfaces_last_error_when_exhausted() {
        let llm = LlmInterface::new_mock_fn(|_s, _u| "still not json".to_string());
        let err = llm
            .call_json_with_retry::<Reply>("s", "u", 2, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("still not json"));
    }
}
