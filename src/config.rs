use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ScreenLoopError, ScreenLoopResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub automation: AutomationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Automation knobs. The engine owns its copy and picks up edits only
/// through `EngineEvent::SettingsChanged`, applied at the next scheduling
/// boundary; `save_config` persists them for the next startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// Master switch. When false, resolved actions are ignored and the
    /// chain paces itself by `interval_seconds` instead of the settle delay.
    #[serde(default)]
    pub enabled: bool,
    /// Spacing between analyze cycles while no actions are being executed.
    /// Clamped to at least one second.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Prompt sent with every capture.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Pause after an act phase (or a no-action cycle) before the next capture.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause before the single bounded capture retry.
    #[serde(default = "default_capture_retry_delay_ms")]
    pub capture_retry_delay_ms: u64,
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_prompt() -> String {
    "Describe the current screen in detail: visible controls, text, \
     statuses, and anything actionable."
        .to_string()
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_capture_retry_delay_ms() -> u64 {
    1000
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_interval_seconds(),
            prompt: default_prompt(),
            settle_delay_ms: default_settle_delay_ms(),
            capture_retry_delay_ms: default_capture_retry_delay_ms(),
        }
    }
}

impl AutomationSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn capture_retry_delay(&self) -> Duration {
        Duration::from_millis(self.capture_retry_delay_ms)
    }
}

fn resolve_config_path() -> ScreenLoopResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(ScreenLoopError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> ScreenLoopResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        base_url = %config.api.base_url,
        automation = config.automation.enabled,
        "config loaded"
    );
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> ScreenLoopResult<()> {
    let path = resolve_config_path()?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
