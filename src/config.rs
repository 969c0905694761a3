use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenaiCompatible,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenaiCompatible => "openai_compatible",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    /// Endpoint override. Gemini: API root; OpenAI-compatible: full chat-completions URL.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Optional API key stored in config.toml (env vars take precedence).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            api_base: None,
            api_key: None,
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "gemini-flash-latest".into()
}

fn default_temperature() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Write the first capture of a run to `screenpilot_debug.jpg`.
    #[serde(default = "default_true")]
    pub debug_screenshot: bool,
    #[serde(default = "default_true")]
    pub narration: bool,
    #[serde(default = "default_narration_command")]
    pub narration_command: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            debug_screenshot: true,
            narration: true,
            narration_command: default_narration_command(),
        }
    }
}

fn default_max_steps() -> u32 {
    20
}

fn default_narration_command() -> String {
    "say".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Os,
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Keep the pointer trail telemetry buffer.
    #[serde(default = "default_true")]
    pub trail: bool,
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            trail: true,
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

fn default_step_interval_ms() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibration_file")]
    pub file: PathBuf,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            file: default_calibration_file(),
        }
    }
}

fn default_calibration_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_true() -> bool {
    true
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    let candidate = dirs::config_dir()?.join("screenpilot").join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in user config dir");
        return Some(candidate);
    }
    None
}

/// Loads `config.toml`; a missing file yields the defaults, a malformed one is an error.
pub fn load_config() -> PilotResult<AppConfig> {
    let Some(path) = resolve_config_path() else {
        tracing::info!("no config.toml found; using defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), provider = config.llm.provider.id(), "config loaded");
    Ok(config)
}

pub fn parse_config(content: &str) -> PilotResult<AppConfig> {
    Ok(toml::from_str(content)?)
}

/// Resolves the API key for the configured provider.
///
/// Lookup order: `SCREENPILOT_<PROVIDER>_API_KEY`, the provider's conventional
/// variables, then `llm.api_key` from config.toml.
pub fn resolve_api_key(llm: &LlmConfig) -> PilotResult<String> {
    let mut names = vec![format!("SCREENPILOT_{}_API_KEY", llm.provider.id().to_uppercase())];
    match llm.provider {
        ProviderKind::Gemini => {
            names.push("GOOGLE_API_KEY".into());
            names.push("GEMINI_API_KEY".into());
        }
        ProviderKind::OpenaiCompatible => names.push("OPENAI_API_KEY".into()),
    }

    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .chain(llm.api_key.clone())
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            PilotError::Config(format!(
                "no API key for provider '{}': set {} or llm.api_key",
                llm.provider.id(),
                names.join(" / ")
            ))
        })
}
