use serde::Deserialize;
use std::path::PathBuf;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5050
///   public_host: "bridge.example.com"
///   max_concurrent_calls: 50
///   tls:
///     cert_path: "/etc/ssl/bridge.pem"
///     key_path: "/etc/ssl/bridge.key"
///
/// openai:
///   api_key: "sk-..."
///   realtime_url: "wss://api.openai.com/v1/realtime"
///   realtime_model: "gpt-4o-realtime-preview-2024-10-01"
///
/// assistant:
///   voice: "alloy"
///   temperature: 0.6
///   greeting: "Hello! Welcome to Rolling Feast."
///   transcription_model: "whisper-1"
///   greeting_fallback_delay_ms: 250
///
/// vad:
///   threshold: 0.5
///   prefix_padding_ms: 300
///   silence_duration_ms: 500
///
/// limits:
///   max_transcript_entries: 1000
///   max_pending_marks: 4096
///
/// business:
///   name: "Rolling Feast"
///
/// email:
///   resend_api_key: "re_..."
///   to: "orders@rollingfeast.com"
///   from: "Rolling Feast <noreply@rollingfeast.com>"
///
/// logging:
///   show_timing_math: false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub assistant: Option<AssistantYaml>,
    pub vad: Option<VadYaml>,
    pub limits: Option<LimitsYaml>,
    pub business: Option<BusinessYaml>,
    pub email: Option<EmailYaml>,
    pub logging: Option<LoggingYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
    pub public_host: Option<String>,
    pub max_concurrent_calls: Option<usize>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// OpenAI Realtime connection from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub realtime_model: Option<String>,
}

/// Assistant persona from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AssistantYaml {
    pub voice: Option<String>,
    pub temperature: Option<f32>,
    pub instructions: Option<String>,
    pub greeting: Option<String>,
    /// Empty string disables caller transcription
    pub transcription_model: Option<String>,
    pub greeting_fallback_delay_ms: Option<u64>,
}

/// Server VAD tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VadYaml {
    pub threshold: Option<f32>,
    pub prefix_padding_ms: Option<u32>,
    pub silence_duration_ms: Option<u32>,
}

/// Per-call bounds from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LimitsYaml {
    pub max_transcript_entries: Option<usize>,
    pub max_pending_marks: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BusinessYaml {
    pub name: Option<String>,
}

/// Summary email delivery from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EmailYaml {
    pub resend_api_key: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingYaml {
    pub show_timing_math: Option<bool>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }
}
