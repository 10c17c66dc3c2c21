//! Loader for carvox configuration with YAML + environment overlays.
//!
//! Precedence, lowest first:
//!
//! 1. the embedded [`DEFAULT_CONFIG_YAML`]
//! 2. YAML files or snippets added with [`CarvoxConfigLoader::with_file`] /
//!    [`CarvoxConfigLoader::with_yaml_str`]
//! 3. `CARVOX__<SECTION>__<KEY>` environment variables
//!
//! After merging, every string value has `${VAR}` placeholders expanded from
//! the process environment. A placeholder whose variable is unset stays in
//! place and the owning credential is then reported as missing by the
//! `require_*` accessors, before any network call is made.
//!
//! The defaults expect four variables: `REDDIT_CLIENT_ID`,
//! `REDDIT_CLIENT_SECRET`, `BING_API_KEY` and `OPENAI_API_KEY`. The Reddit
//! app id is a credential too and has no built-in value.
use carvox_common::{CarvoxError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Built-in defaults. Credentials point at the conventional variables.
pub const DEFAULT_CONFIG_YAML: &str = r#"
reddit:
  client_id: "${REDDIT_CLIENT_ID}"
  client_secret: "${REDDIT_CLIENT_SECRET}"
  user_agent: "car_review_scraper"
  subreddit: "cars"
  search_limit: 20
  comments_per_post: 3
  auth_url: "https://www.reddit.com/api/v1/access_token"
  api_url: "https://oauth.reddit.com"
bing:
  api_key: "${BING_API_KEY}"
  endpoint: "https://api.bing.microsoft.com/v7.0/search"
  result_count: 5
llm:
  provider: openai
  model: "gpt-4o"
  api_key: "${OPENAI_API_KEY}"
  endpoint: "https://api.openai.com/v1"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct CarvoxConfig {
    pub reddit: RedditConfig,
    pub bing: BingConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub subreddit: String,
    pub search_limit: u32,
    pub comments_per_post: usize,
    /// Token endpoint for the application-only OAuth flow.
    pub auth_url: String,
    /// Base of the authenticated API (`/r/{sub}/search`, `/comments/{id}`).
    pub api_url: String,
}

impl RedditConfig {
    /// The Reddit app id. Required together with the secret for the
    /// application-only token exchange.
    pub fn require_client_id(&self) -> Result<&str> {
        require_credential(&self.client_id, "REDDIT_CLIENT_ID").map_err(|_| {
            CarvoxError::Auth(
                "REDDIT_CLIENT_ID is not set; Reddit needs the app id as well as \
                 REDDIT_CLIENT_SECRET, export it or set reddit.client_id in the config file"
                    .into(),
            )
        })
    }

    pub fn require_client_secret(&self) -> Result<&str> {
        require_credential(&self.client_secret, "REDDIT_CLIENT_SECRET")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BingConfig {
    pub api_key: String,
    pub endpoint: String,
    pub result_count: u32,
}

impl BingConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        require_credential(&self.api_key, "BING_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Openai {
        model: String,
        api_key: String,
        endpoint: String,
    },
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        match self {
            LlmConfig::Openai { model, .. } => model,
        }
    }

    pub fn set_model(&mut self, new_model: impl Into<String>) {
        match self {
            LlmConfig::Openai { model, .. } => *model = new_model.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            LlmConfig::Openai { endpoint, .. } => endpoint,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        match self {
            LlmConfig::Openai { api_key, .. } => require_credential(api_key, "OPENAI_API_KEY"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout. Unset means wait for the server.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Return the trimmed credential, or an auth error naming `var` when it is
/// blank or still an unexpanded `${...}` placeholder.
///
/// ```
/// use carvox_config::require_credential;
///
/// assert_eq!(require_credential(" abc ", "X").unwrap(), "abc");
/// assert!(require_credential("", "X").unwrap_err().is_auth());
/// assert!(require_credential("${X}", "X").unwrap_err().is_auth());
/// ```
pub fn require_credential<'a>(value: &'a str, var: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        return Err(CarvoxError::Auth(format!(
            "{var} is not set; export it or provide the value in the config file"
        )));
    }
    Ok(trimmed)
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct CarvoxConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CarvoxConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CarvoxConfigLoader {
    /// Start from the embedded defaults.
    ///
    /// ```
    /// use carvox_config::CarvoxConfigLoader;
    ///
    /// let config = CarvoxConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.reddit.subreddit, "cars");
    /// assert_eq!(config.reddit.search_limit, 20);
    /// assert_eq!(config.bing.result_count, 5);
    /// assert_eq!(config.llm.model(), "gpt-4o");
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use carvox_config::CarvoxConfigLoader;
    ///
    /// let cfg = CarvoxConfigLoader::new()
    ///     .with_yaml_str("reddit:\n  subreddit: \"electricvehicles\"\n")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.reddit.subreddit, "electricvehicles");
    /// assert_eq!(cfg.reddit.comments_per_post, 3);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into typed config.
    ///
    /// ```
    /// use carvox_config::CarvoxConfigLoader;
    ///
    /// unsafe { std::env::set_var("CARVOX_DOC_BING_KEY", "injected-from-env"); }
    ///
    /// let config = CarvoxConfigLoader::new()
    ///     .with_yaml_str("bing:\n  api_key: \"${CARVOX_DOC_BING_KEY}\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.bing.require_api_key().unwrap(), "injected-from-env");
    /// assert_eq!(config.bing.endpoint, "https://api.bing.microsoft.com/v7.0/search");
    ///
    /// unsafe { std::env::remove_var("CARVOX_DOC_BING_KEY"); }
    /// ```
    pub fn load(self) -> Result<CarvoxConfig> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CARVOX")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| CarvoxError::Config(e.to_string()))?;

        let mut v: Value = cfg
            .try_deserialize()
            .map_err(|e| CarvoxError::Config(e.to_string()))?;
        expand_env_in_value(&mut v);

        // Env overrides arrive as strings; deserializing through `config`
        // again coerces "7" into numeric fields and keeps "0123" a string.
        let typed: CarvoxConfig = Config::try_from(&v)
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| CarvoxError::Config(e.to_string()))?;

        tracing::debug!(
            subreddit = %typed.reddit.subreddit,
            search_limit = typed.reddit.search_limit,
            bing_endpoint = %typed.bing.endpoint,
            model = %typed.llm.model(),
            "configuration loaded"
        );
        Ok(typed)
    }
}
