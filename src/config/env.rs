//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Build a configuration from the process environment on top of defaults.
///
/// Validation is left to the caller so YAML overrides can fill gaps first.
pub(super) fn load() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();

    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse("PORT")? {
        config.port = port;
    }
    config.tls = tls_from_env()?;
    config.public_host = var("PUBLIC_HOST");
    config.max_concurrent_calls = parse("MAX_CONCURRENT_CALLS")?;

    config.openai_api_key = var("OPENAI_API_KEY");
    if let Some(url) = var("OPENAI_REALTIME_URL") {
        config.openai_realtime_url = url;
    }
    if let Some(model) = var("OPENAI_REALTIME_MODEL") {
        config.openai_realtime_model = model;
    }

    if let Some(voice) = var("AI_VOICE") {
        config.ai_voice = voice;
    }
    if let Some(temperature) = parse("AI_TEMPERATURE")? {
        config.ai_temperature = temperature;
    }
    if let Some(instructions) = var("AI_INSTRUCTIONS") {
        config.ai_instructions = instructions;
    }
    // An explicitly empty greeting disables it, so read the raw value.
    if let Ok(greeting) = env::var("AI_GREETING") {
        config.ai_greeting = greeting;
    }
    if let Ok(model) = env::var("TRANSCRIPTION_MODEL") {
        config.transcription_model = model.trim().to_string();
    }

    if let Some(threshold) = parse("VAD_THRESHOLD")? {
        config.vad.threshold = threshold;
    }
    if let Some(padding) = parse("VAD_PREFIX_PADDING_MS")? {
        config.vad.prefix_padding_ms = padding;
    }
    if let Some(silence) = parse("VAD_SILENCE_DURATION_MS")? {
        config.vad.silence_duration_ms = silence;
    }

    if let Some(delay) = parse("GREETING_FALLBACK_DELAY_MS")? {
        config.greeting_fallback_delay_ms = delay;
    }
    if let Some(max) = parse("MAX_TRANSCRIPT_ENTRIES")? {
        config.max_transcript_entries = max;
    }
    if let Some(max) = parse("MAX_PENDING_MARKS")? {
        config.max_pending_marks = max;
    }
    if let Some(show) = parse_bool("SHOW_TIMING_MATH")? {
        config.show_timing_math = show;
    }

    if let Some(name) = var("BUSINESS_NAME") {
        config.business_name = name;
    }
    config.resend_api_key = var("RESEND_API_KEY");
    config.orders_email_to = var("ORDERS_EMAIL_TO");
    if let Some(from) = var("EMAIL_FROM") {
        config.email_from = from;
    }

    Ok(config)
}

fn tls_from_env() -> Result<Option<TlsConfig>, ConfigError> {
    match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing("TLS_KEY_PATH")),
        (None, Some(_)) => Err(ConfigError::Missing("TLS_CERT_PATH")),
    }
}

/// Non-empty, trimmed value of a variable.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match var(key) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
        None => Ok(None),
    }
}
