//! Applying YAML values over an environment-derived configuration.

use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Overwrite every field the YAML file sets.
pub(super) fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(public_host) = server.public_host {
            config.public_host = Some(public_host);
        }
        if let Some(max) = server.max_concurrent_calls {
            config.max_concurrent_calls = Some(max);
        }
        if let Some(tls) = server.tls {
            if tls.enabled == Some(false) {
                config.tls = None;
            } else if let (Some(cert), Some(key)) = (tls.cert_path, tls.key_path) {
                config.tls = Some(TlsConfig {
                    cert_path: PathBuf::from(cert),
                    key_path: PathBuf::from(key),
                });
            }
        }
    }

    if let Some(openai) = yaml.openai {
        if let Some(key) = openai.api_key {
            config.openai_api_key = Some(key);
        }
        if let Some(url) = openai.realtime_url {
            config.openai_realtime_url = url;
        }
        if let Some(model) = openai.realtime_model {
            config.openai_realtime_model = model;
        }
    }

    if let Some(assistant) = yaml.assistant {
        if let Some(voice) = assistant.voice {
            config.ai_voice = voice;
        }
        if let Some(temperature) = assistant.temperature {
            config.ai_temperature = temperature;
        }
        if let Some(instructions) = assistant.instructions {
            config.ai_instructions = instructions;
        }
        if let Some(greeting) = assistant.greeting {
            config.ai_greeting = greeting;
        }
        if let Some(model) = assistant.transcription_model {
            config.transcription_model = model.trim().to_string();
        }
        if let Some(delay) = assistant.greeting_fallback_delay_ms {
            config.greeting_fallback_delay_ms = delay;
        }
    }

    if let Some(vad) = yaml.vad {
        if let Some(threshold) = vad.threshold {
            config.vad.threshold = threshold;
        }
        if let Some(padding) = vad.prefix_padding_ms {
            config.vad.prefix_padding_ms = padding;
        }
        if let Some(silence) = vad.silence_duration_ms {
            config.vad.silence_duration_ms = silence;
        }
    }

    if let Some(limits) = yaml.limits {
        if let Some(max) = limits.max_transcript_entries {
            config.max_transcript_entries = max;
        }
        if let Some(max) = limits.max_pending_marks {
            config.max_pending_marks = max;
        }
    }

    if let Some(name) = yaml.business.and_then(|b| b.name) {
        config.business_name = name;
    }

    if let Some(email) = yaml.email {
        if let Some(key) = email.resend_api_key {
            config.resend_api_key = Some(key);
        }
        if let Some(to) = email.to {
            config.orders_email_to = Some(to);
        }
        if let Some(from) = email.from {
            config.email_from = from;
        }
    }

    if let Some(show) = yaml.logging.and_then(|l| l.show_timing_math) {
        config.show_timing_math = show;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_changes_nothing() {
        let mut config = ServerConfig::default();
        apply_yaml(&mut config, YamlConfig::default());
        assert_eq!(config.port, 5050);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_tls_disabled_in_yaml_clears_env_tls() {
        let mut config = ServerConfig::default();
        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from("/a"),
            key_path: PathBuf::from("/b"),
        });

        let yaml = YamlConfig::from_yaml_str("server:\n  tls:\n    enabled: false\n").unwrap();
        apply_yaml(&mut config, yaml);
        assert!(config.tls.is_none());
    }

    #[test]
    fn test_nested_sections_override() {
        let mut config = ServerConfig::default();
        let yaml = YamlConfig::from_yaml_str(
            "vad:\n  prefix_padding_ms: 200\nlimits:\n  max_transcript_entries: 50\nlogging:\n  show_timing_math: true\n",
        )
        .unwrap();
        apply_yaml(&mut config, yaml);

        assert_eq!(config.vad.prefix_padding_ms, 200);
        assert_eq!(config.vad.threshold, 0.5);
        assert_eq!(config.max_transcript_entries, 50);
        assert!(config.show_timing_math);
    }
}
