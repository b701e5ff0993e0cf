use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `ASYNC_NLP__SERVER__PORT=9000`.
const ENV_PREFIX: &str = "ASYNC_NLP";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub storage: StorageConfig,
    pub jobs: JobsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// "tgi" for a text-generation server, "echo" for the offline engine.
    pub provider: String,
    /// Limit on a single engine call in seconds; 0 disables it. Time spent
    /// waiting for the engine does not count.
    pub request_timeout_secs: u64,
    pub qa: ModelConfig,
    pub summarize: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub max_new_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// "local" keeps books in `scratch_dir` only, "s3" syncs through a bucket.
    pub provider: String,
    pub scratch_dir: PathBuf,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    #[serde(default)]
    pub s3_access_key_id: Option<String>,
    #[serde(default)]
    pub s3_secret_access_key: Option<String>,
    #[serde(default)]
    pub s3_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Jobs that may be waiting or running at once.
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl EngineConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Config {
    /// Load configuration from a YAML file, if it exists, layered over the
    /// built-in defaults and under `ASYNC_NLP__*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw = if path.exists() {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?
        } else {
            String::new()
        };

        Self::from_yaml_str(&raw)
    }

    /// Build a configuration from raw YAML text. `${VAR}` references are
    /// substituted from the environment before parsing.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let substituted = envsubst(raw);

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("engine.provider", "tgi")?
            .set_default("engine.request_timeout_secs", 300_i64)?
            .set_default("engine.qa.endpoint", "http://localhost:8081")?
            .set_default("engine.qa.model", "macaw-large")?
            .set_default("engine.qa.max_new_tokens", 300_i64)?
            .set_default("engine.summarize.endpoint", "http://localhost:8082")?
            .set_default("engine.summarize.model", "led-large-16384-arxiv")?
            .set_default("storage.provider", "local")?
            .set_default("storage.scratch_dir", "data")?
            .set_default("storage.s3_region", "us-east-1")?
            .set_default("jobs.queue_capacity", 64_i64)?;

        if !substituted.trim().is_empty() {
            builder = builder.add_source(config::File::from_str(
                &substituted,
                config::FileFormat::Yaml,
            ));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

/// Replace every `${NAME}` in `raw` with the value of the environment
/// variable `NAME`. Unset variables become the empty string; an unterminated
/// `${` is left as is.
pub fn envsubst(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(&env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envsubst_replaces_known_variables() {
        env::set_var("ASYNC_NLP_TEST_BUCKET", "books");
        let out = envsubst("bucket: ${ASYNC_NLP_TEST_BUCKET}\nregion: eu");
        assert_eq!(out, "bucket: books\nregion: eu");
    }

    #[test]
    fn test_envsubst_unset_and_unterminated() {
        env::remove_var("ASYNC_NLP_TEST_UNSET");
        assert_eq!(envsubst("a: '${ASYNC_NLP_TEST_UNSET}'"), "a: ''");
        assert_eq!(envsubst("a: ${OOPS"), "a: ${OOPS");
        assert_eq!(envsubst("no references"), "no references");
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config.engine.qa.max_new_tokens, Some(300));
        assert_eq!(config.engine.summarize.max_new_tokens, None);
        assert_eq!(config.storage.provider, "local");
        assert_eq!(config.jobs.queue_capacity, 64);
        assert_eq!(config.engine.call_timeout(), Some(Duration::from_secs(300)));
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        env::set_var("ASYNC_NLP_TEST_ENDPOINT", "http://gpu-box:9000");
        let yaml = r#"
engine:
  provider: echo
  request_timeout_secs: 0
  summarize:
    endpoint: ${ASYNC_NLP_TEST_ENDPOINT}
    model: led-base
jobs:
  queue_capacity: 4
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.engine.provider, "echo");
        assert_eq!(config.engine.summarize.endpoint, "http://gpu-box:9000");
        assert_eq!(config.engine.summarize.model, "led-base");
        assert_eq!(config.engine.qa.model, "macaw-large");
        assert_eq!(config.engine.call_timeout(), None);
        assert_eq!(config.jobs.queue_capacity, 4);
    }
}
