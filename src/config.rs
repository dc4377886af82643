use crate::flow::Tweaks;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hosted Langflow base URL shared by the built-in profiles
pub const DEFAULT_BASE_URL: &str = "https://api.langflow.astra.datastax.com";

pub const LANGFLOW_ID_ENV: &str = "LANGFLOW_ID";
pub const FLOW_ID_ENV: &str = "FLOW_ID";
pub const APP_TOKEN_ENV: &str = "APP_TOKEN";
pub const HOME_ENV: &str = "FLOWCHAT_HOME";

const CONFIG_FILE: &str = "config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profile used when none is given on the command line
    pub active_profile: String,

    /// Request timeout; reqwest's default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Default tracing filter, overridden by `FLOWCHAT_LOG`
    pub log_filter: String,

    /// Named flow profiles; file entries are layered over built-ins
    #[serde(deserialize_with = "deserialize_profiles")]
    pub profiles: BTreeMap<String, FlowProfile>,

    /// Flowchat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Connection settings for one flow, possibly incomplete until resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowProfile {
    pub title: String,
    pub intro: String,
    pub placeholder: String,
    pub base_url: String,

    /// Falls back to `LANGFLOW_ID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langflow_id: Option<String>,

    /// Falls back to `FLOW_ID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Falls back to `APP_TOKEN`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweaks: Option<Tweaks>,
}

/// A `[profiles.<name>]` table as written; unset fields keep the base value
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProfileOverride {
    title: Option<String>,
    intro: Option<String>,
    placeholder: Option<String>,
    base_url: Option<String>,
    langflow_id: Option<String>,
    endpoint: Option<String>,
    application_token: Option<String>,
    tweaks: Option<Tweaks>,
}

impl ProfileOverride {
    fn apply(self, mut base: FlowProfile) -> FlowProfile {
        if let Some(title) = self.title {
            base.title = title;
        }
        if let Some(intro) = self.intro {
            base.intro = intro;
        }
        if let Some(placeholder) = self.placeholder {
            base.placeholder = placeholder;
        }
        if let Some(base_url) = self.base_url {
            base.base_url = base_url;
        }
        base.langflow_id = self.langflow_id.or(base.langflow_id);
        base.endpoint = self.endpoint.or(base.endpoint);
        base.application_token = self.application_token.or(base.application_token);
        base.tweaks = self.tweaks.or(base.tweaks);
        base
    }
}

fn deserialize_profiles<'de, D>(deserializer: D) -> Result<BTreeMap<String, FlowProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, ProfileOverride>::deserialize(deserializer)?;
    let mut profiles = builtin_profiles();
    for (name, profile) in overrides {
        let base = profiles.remove(&name).unwrap_or_default();
        profiles.insert(name, profile.apply(base));
    }
    Ok(profiles)
}

/// A profile with every value filled in
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    pub name: String,
    pub title: String,
    pub intro: String,
    pub placeholder: String,
    pub base_url: String,
    pub langflow_id: String,
    pub endpoint: String,
    pub token: String,
    pub tweaks: Option<Tweaks>,
}

impl FlowProfile {
    /// Profile for the social media assistant flow.
    pub fn social_media() -> Self {
        Self {
            title: "Social Media AI Assistant".to_string(),
            intro: "Welcome to the Social Media AI Assistant! Ask me anything about social media marketing, strategy, content creation, or analytics."
                .to_string(),
            placeholder: "E.g., 'Which post should I do more images or reels? Support with some statistics.'"
                .to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            langflow_id: None,
            endpoint: Some("socialmedia".to_string()),
            application_token: None,
            tweaks: None,
        }
    }

    /// Profile addressing a flow by `FLOW_ID`, with static component tweaks.
    pub fn flow() -> Self {
        let mut tweaks = Tweaks::new();
        tweaks.insert("ChatInput".to_string(), Value::Object(Default::default()));
        tweaks.insert("ChatOutput".to_string(), Value::Object(Default::default()));

        Self {
            tweaks: Some(tweaks),
            ..Self::default()
        }
    }

    /// Fill missing values from `lookup`, usually the process environment.
    pub fn resolve_with<F>(&self, name: &str, lookup: F) -> Result<FlowSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |configured: &Option<String>, env: &str| -> Result<String> {
            configured
                .clone()
                .or_else(|| lookup(env))
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("profile '{}' needs {} (set it in config.toml or the environment)", name, env))
        };

        Ok(FlowSettings {
            name: name.to_string(),
            title: self.title.clone(),
            intro: self.intro.clone(),
            placeholder: self.placeholder.clone(),
            base_url: self.base_url.clone(),
            langflow_id: pick(&self.langflow_id, LANGFLOW_ID_ENV)?,
            endpoint: pick(&self.endpoint, FLOW_ID_ENV)?,
            token: pick(&self.application_token, APP_TOKEN_ENV)?,
            tweaks: self.tweaks.clone(),
        })
    }

    pub fn resolve(&self, name: &str) -> Result<FlowSettings> {
        self.resolve_with(name, |key| std::env::var(key).ok())
    }
}

impl Default for FlowProfile {
    /// Starting point for profiles that exist only in `config.toml`
    fn default() -> Self {
        Self {
            title: "Langflow Assistant".to_string(),
            intro: "Ask a question and the flow will answer it.".to_string(),
            placeholder: "Ask the flow anything...".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            langflow_id: None,
            endpoint: None,
            application_token: None,
            tweaks: None,
        }
    }
}

fn builtin_profiles() -> BTreeMap<String, FlowProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert("social-media".to_string(), FlowProfile::social_media());
    profiles.insert("flow".to_string(), FlowProfile::flow());
    profiles
}

impl Default for Config {
    fn default() -> Self {
        Config {
            active_profile: "social-media".to_string(),
            request_timeout_secs: None,
            log_filter: "info".to_string(),
            profiles: builtin_profiles(),
            home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flowchat")
}

impl Config {
    /// Load `.env`, then `config.toml` from the flowchat home directory
    pub fn load() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("Failed to read .env file");
            }
        }
        Self::load_from(&default_home())
    }

    /// Load configuration rooted at `home`, creating the directory if needed
    pub fn load_from(home: &Path) -> Result<Self> {
        fs::create_dir_all(home).context("Failed to create flowchat home directory")?;

        let config_path = home.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            Self::from_toml(&content)?
        } else {
            Config::default()
        };

        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Parse a config file; built-in profiles not named in it stay available.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(self.config_path(), content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn profile(&self, name: &str) -> Result<&FlowProfile> {
        self.profiles.get(name).ok_or_else(|| {
            let known: Vec<_> = self.profiles.keys().map(String::as_str).collect();
            anyhow!("Unknown profile '{}' (available: {})", name, known.join(", "))
        })
    }

    /// Resolve `name`, or the active profile, against the environment
    pub fn settings(&self, name: Option<&str>) -> Result<FlowSettings> {
        let name = name.unwrap_or(&self.active_profile);
        self.profile(name)?.resolve(name)
    }
}
