use std::env;
use std::fmt;

use crate::switch::{StatusWords, SwitchState};

/// Placeholder used for credentials that were not provided.
pub const MISSING: &str = "missing";

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub initial_state: Option<SwitchState>,
    pub forward: ForwardConfig,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    /// Sent as a 16-bit field in CONNECT.
    pub keepalive_secs: u16,
    pub topic: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Which remote service a relay instance updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    Profile,
    Switchifier,
}

impl RelayMode {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "profile" | "twitter" => Ok(Self::Profile),
            "switchifier" | "http" => Ok(Self::Switchifier),
            other => Err(format!(
                "RELAY_MODE must be 'profile' or 'switchifier', got '{other}'"
            )),
        }
    }

    fn default_broker_host(self) -> &'static str {
        match self {
            Self::Profile => "10.48.1.254",
            Self::Switchifier => "0.0.0.0",
        }
    }

    fn default_topic(self) -> &'static str {
        match self {
            Self::Profile => "/tog/sensors/knife_switch/knife_switch_ca750200",
            Self::Switchifier => "/tog/sensors/knife_switch/+",
        }
    }

    /// Each relay seeds from its own variable.
    fn initial_state_key(self) -> &'static str {
        match self {
            Self::Profile => "TOG_SWITCH_STATUS",
            Self::Switchifier => "SWITCHIFIER_INITIAL_STATE",
        }
    }

    fn default_initial_state(self) -> Option<SwitchState> {
        match self {
            Self::Profile => None,
            Self::Switchifier => Some(SwitchState::new(1)),
        }
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Switchifier => f.write_str("switchifier"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ForwardConfig {
    Profile(ProfileConfig),
    Switchifier(SwitchifierConfig),
}

impl ForwardConfig {
    pub fn mode(&self) -> RelayMode {
        match self {
            Self::Profile(_) => RelayMode::Profile,
            Self::Switchifier(_) => RelayMode::Switchifier,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub api_url: String,
    pub credentials: OAuthCredentials,
    pub user_id: u64,
    pub marker: String,
    pub words: StatusWords,
}

#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl OAuthCredentials {
    pub fn any_missing(&self) -> bool {
        [
            &self.consumer_key,
            &self.consumer_secret,
            &self.access_token,
            &self.access_token_secret,
        ]
        .iter()
        .any(|v| v.as_str() == MISSING)
    }
}

// Secrets stay out of logs.
impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct SwitchifierConfig {
    pub url: String,
    pub secret: String,
    pub invert: bool,
}

impl fmt::Debug for SwitchifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchifierConfig")
            .field("url", &self.url)
            .field("invert", &self.invert)
            .finish_non_exhaustive()
    }
}

/// Reads configuration values by key. `std::env::var` in production.
struct Source<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Source<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        (self.lookup)(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, String>
    where
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| format!("{key} has invalid value '{v}': {e}")),
            None => Ok(default),
        }
    }

    fn flag_or(&self, key: &str, default: bool) -> Result<bool, String> {
        match self.optional(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(format!("{key} must be a boolean, got '{v}'")),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, String> {
        let src = Source { lookup };

        let mode = match src.optional("RELAY_MODE") {
            Some(raw) => RelayMode::parse(&raw)?,
            None => RelayMode::Profile,
        };

        let state_key = mode.initial_state_key();
        let initial_state = match src.optional(state_key) {
            Some(raw) => Some(
                raw.parse::<SwitchState>()
                    .map_err(|e| format!("{state_key}: {e}"))?,
            ),
            None => mode.default_initial_state(),
        };

        let forward = match mode {
            RelayMode::Profile => ForwardConfig::Profile(ProfileConfig {
                api_url: src.or_default("TWITTER_API_URL", "https://api.twitter.com"),
                credentials: OAuthCredentials {
                    consumer_key: src.or_default("TWITTER_CONSUMER_KEY", MISSING),
                    consumer_secret: src.or_default("TWITTER_CONSUMER_SECRET", MISSING),
                    access_token: src.or_default("TWITTER_ACCESS_TOKEN", MISSING),
                    access_token_secret: src.or_default("TWITTER_ACCESS_TOKEN_SECRET", MISSING),
                },
                user_id: src.parsed_or("TWITTER_ID", 76108817)?,
                marker: src.or_default("TWITTER_BIO_MESSAGE", " Space is: "),
                words: StatusWords {
                    open: src.or_default("TOG_OPEN_STATUS", "OPEN"),
                    closed: src.or_default("TOG_CLOSED_STATUS", "CLOSED"),
                },
            }),
            RelayMode::Switchifier => {
                let secret = match src.optional("SWITCHIFIER_SECRET_PATH") {
                    Some(path) => read_secret_file(&path)?,
                    None => src.or_default("SWITCHIFIER_SECRET", MISSING),
                };
                ForwardConfig::Switchifier(SwitchifierConfig {
                    url: src.or_default(
                        "SWITCHIFIER_URL",
                        "https://api.tog.ie/api/1/switchifier/update",
                    ),
                    secret,
                    invert: src.flag_or("SWITCHIFIER_INVERT", true)?,
                })
            }
        };

        let config = Self {
            mqtt: MqttConfig {
                broker_host: src.or_default("MQTT_HOST", mode.default_broker_host()),
                broker_port: src.parsed_or("MQTT_PORT", 1883)?,
                keepalive_secs: src.parsed_or("MQTT_KEEPALIVE", 60)?,
                topic: src.or_default("MQTT_TOPIC", mode.default_topic()),
                client_id: src
                    .optional("MQTT_CLIENT_ID")
                    .unwrap_or_else(|| format!("switch-relay-{}", std::process::id())),
                username: src.optional("MQTT_USERNAME"),
                password: src.optional("MQTT_PASSWORD"),
            },
            initial_state,
            forward,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mqtt.broker_host.trim().is_empty() {
            return Err("MQTT_HOST must not be empty".into());
        }
        if self.mqtt.keepalive_secs < 5 {
            return Err("MQTT_KEEPALIVE must be at least 5 seconds".into());
        }
        if self.mqtt.topic.is_empty() {
            return Err("MQTT_TOPIC must not be empty".into());
        }
        match &self.forward {
            ForwardConfig::Profile(profile) => {
                if profile.marker.is_empty() {
                    return Err("TWITTER_BIO_MESSAGE must not be empty".into());
                }
                if profile.api_url.is_empty() {
                    return Err("TWITTER_API_URL must not be empty".into());
                }
            }
            ForwardConfig::Switchifier(switchifier) => {
                if switchifier.url.is_empty() {
                    return Err("SWITCHIFIER_URL must not be empty".into());
                }
            }
        }
        Ok(())
    }
}

/// The secret is the first line of the file.
fn read_secret_file(path: &str) -> Result<String, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    Ok(content.lines().next().unwrap_or_default().to_string())
}
