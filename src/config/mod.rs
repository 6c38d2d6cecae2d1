//! Configuration module for the call bridge
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading
//! - `merge`: Applying YAML overrides on top of the environment
//!
//! # Example
//! ```rust,no_run
//! use callbridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::realtime::{
    DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL, InputTranscriptionConfig,
    OPENAI_REALTIME_URL, RealtimeConfig, SessionConfig, TurnDetectionConfig,
};
use crate::core::session::{DEFAULT_GREETING_FALLBACK_DELAY, SessionSettings};

mod env;
mod merge;
mod yaml;

pub use yaml::YamlConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5050;

/// Business the assistant answers for.
pub const DEFAULT_BUSINESS_NAME: &str = "Rolling Feast";

/// Sender address for summary emails.
pub const DEFAULT_EMAIL_FROM: &str = "Rolling Feast <noreply@rollingfeast.com>";

/// Default realtime model name.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Default assistant voice.
pub const DEFAULT_VOICE: &str = "alloy";

/// Audio format on both legs; Twilio media streams carry 8 kHz mu-law.
pub const TELEPHONY_AUDIO_FORMAT: &str = "g711_ulaw";

/// Opening line the assistant is asked to speak.
pub const DEFAULT_GREETING: &str = "Hello! Welcome to Rolling Feast. How can I help you today - would you like to place an order or make a reservation?";

/// System prompt for the restaurant assistant.
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are a professional, warm, and efficient phone assistant for "Rolling Feast" restaurant.

Language Guidelines:
- Start conversations in English by default
- If the customer speaks in Hindi or Hinglish, seamlessly switch to that language
- Match the customer's preferred language naturally throughout the conversation
- Be fluent in English, Hindi, and Hinglish code-switching

Communication Style:
- Speak with confidence and clarity like a premium support agent
- Maintain a warm, professional, and helpful tone
- Keep responses concise and actionable
- Speak at a natural, slightly faster pace for efficiency
- Use smooth transitions between topics
- Ask focused questions to understand customer needs quickly
- Provide clear next steps and confirmations

Your goal is to provide exceptional customer service that feels both professional and personable, adapting fluidly to the customer's language preference."#;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse YAML config: {0}")]
    ParseFailed(String),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Voice activity detection settings forwarded to the AI service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadSettings {
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 500,
        }
    }
}

/// Server configuration
///
/// Contains everything needed to run the bridge:
/// - Server settings (host, port, TLS, public host)
/// - OpenAI Realtime connection and assistant persona
/// - Per-call limits and timing
/// - Post-call summary email delivery
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,

    /// Host placed in the TwiML stream URL instead of the request `Host`
    pub public_host: Option<String>,
    /// Refuse new media streams beyond this many live calls
    pub max_concurrent_calls: Option<usize>,

    // OpenAI Realtime
    pub openai_api_key: Option<String>,
    pub openai_realtime_url: String,
    pub openai_realtime_model: String,

    // Assistant persona
    pub ai_voice: String,
    pub ai_temperature: f32,
    pub ai_instructions: String,
    pub ai_greeting: String,
    /// Caller transcription model; empty disables caller transcription
    pub transcription_model: String,
    pub vad: VadSettings,

    // Per-call behaviour
    pub greeting_fallback_delay_ms: u64,
    pub max_transcript_entries: usize,
    pub max_pending_marks: usize,
    pub show_timing_math: bool,

    // Summary delivery
    pub business_name: String,
    pub resend_api_key: Option<String>,
    pub orders_email_to: Option<String>,
    pub email_from: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tls: None,
            public_host: None,
            max_concurrent_calls: None,
            openai_api_key: None,
            openai_realtime_url: OPENAI_REALTIME_URL.to_string(),
            openai_realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
            ai_voice: DEFAULT_VOICE.to_string(),
            ai_temperature: DEFAULT_TEMPERATURE,
            ai_instructions: DEFAULT_INSTRUCTIONS.to_string(),
            ai_greeting: DEFAULT_GREETING.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            vad: VadSettings::default(),
            greeting_fallback_delay_ms: DEFAULT_GREETING_FALLBACK_DELAY.as_millis() as u64,
            max_transcript_entries: crate::core::transcript::DEFAULT_MAX_TRANSCRIPT_ENTRIES,
            max_pending_marks: crate::core::playback::DEFAULT_MAX_PENDING_MARKS,
            show_timing_math: false,
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
            resend_api_key: None,
            orders_email_to: None,
            email_from: DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}

impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.resend_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// The .env file is loaded in `main` before this runs, so actual
    /// environment variables win over .env values.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or
    /// `OPENAI_API_KEY` is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if the YAML file cannot be read or is malformed,
    /// an environment variable is malformed, or validation fails.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = env::load()?;
        merge::apply_yaml(&mut config, yaml_config);

        config.validate()?;
        Ok(config)
    }

    /// Check the merged configuration for values the bridge cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai_api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }

        if !(0.0..=1.0).contains(&self.vad.threshold) {
            return Err(ConfigError::InvalidValue {
                key: "VAD_THRESHOLD".to_string(),
                value: self.vad.threshold.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }

        if !self.ai_temperature.is_finite() || self.ai_temperature <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "AI_TEMPERATURE".to_string(),
                value: self.ai_temperature.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }

        if self.max_transcript_entries == 0 || self.max_pending_marks == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_TRANSCRIPT_ENTRIES/MAX_PENDING_MARKS".to_string(),
                value: "0".to_string(),
                reason: "limits must be at least 1".to_string(),
            });
        }

        if self.max_concurrent_calls == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "MAX_CONCURRENT_CALLS".to_string(),
                value: "0".to_string(),
                reason: "unset it for unlimited calls".to_string(),
            });
        }

        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// True when an OpenAI key is present.
    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// True when summaries can be emailed rather than only logged.
    pub fn has_email_delivery(&self) -> bool {
        self.resend_api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.orders_email_to.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Connection settings for the OpenAI Realtime client.
    pub fn realtime_config(&self) -> RealtimeConfig {
        let input_audio_transcription = if self.transcription_model.is_empty() {
            None
        } else {
            Some(InputTranscriptionConfig {
                model: self.transcription_model.clone(),
            })
        };

        RealtimeConfig {
            api_key: self.openai_api_key.clone().unwrap_or_default(),
            url: self.openai_realtime_url.clone(),
            model: self.openai_realtime_model.clone(),
            voice: Some(self.ai_voice.clone()),
            instructions: Some(self.ai_instructions.clone()),
            temperature: Some(self.ai_temperature),
            input_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            output_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            input_audio_transcription,
            turn_detection: Some(TurnDetectionConfig::ServerVad {
                threshold: Some(self.vad.threshold),
                prefix_padding_ms: Some(self.vad.prefix_padding_ms),
                silence_duration_ms: Some(self.vad.silence_duration_ms),
            }),
            modalities: None,
        }
    }

    /// Per-call settings, given the session configuration the client built.
    pub fn session_settings(&self, session: SessionConfig) -> SessionSettings {
        SessionSettings {
            session,
            greeting: self.ai_greeting.clone(),
            greeting_fallback_delay: Duration::from_millis(self.greeting_fallback_delay_ms),
            max_transcript_entries: self.max_transcript_entries,
            max_pending_marks: self.max_pending_marks,
            show_timing_math: self.show_timing_math,
        }
    }
}
