//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. `AppConfig::from_lookup` takes any key lookup so tests can feed a
//! plain map instead of mutating the real environment.

use secrecy::SecretString;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

use crate::crm::{DispatchMode, PayloadFormat};
use crate::llm::{GenerationConfig, DEFAULT_FALLBACK_REPLY, DEFAULT_SYSTEM_PROMPT};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("invalid value for `{key}`: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("could not read .env file: {0}")]
    DotEnv(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub kommo: KommoConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub generation: GenerationConfig,
}

#[derive(Clone, Debug)]
pub struct KommoConfig {
    pub api_url: String,
    pub token: Option<SecretString>,
    pub timeout_secs: u64,
    pub payload_format: PayloadFormat,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub system_prompt: String,
    pub fallback_reply: String,
    pub dispatch_mode: DispatchMode,
    /// When set, inbound webhooks must present this token
    pub webhook_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{}`", other)),
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    /// A `.env` that exists but cannot be parsed is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv_loaded(dotenvy::dotenv().map(|_| ()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let server = ServerConfig {
            host: env.parsed("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: env.parsed("PORT", DEFAULT_PORT)?,
        };

        let mut generation = GenerationConfig::new();
        if let Some(max_tokens) = env.parsed_opt::<u32>("OPENAI_MAX_TOKENS")? {
            generation = generation.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = env.parsed_opt::<f32>("OPENAI_TEMPERATURE")? {
            generation = generation.with_temperature(temperature);
        }

        let openai = OpenAiConfig {
            api_key: SecretString::from(env.required("OPENAI_API_KEY")?),
            base_url: env
                .optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: env
                .optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            timeout_secs: env.parsed("OPENAI_TIMEOUT_SECS", 30)?,
            generation,
        };

        let api_url = env
            .optional("KOMMO_API_URL")
            .or_else(|| env.optional("KOMMO_WEBHOOK_URL"))
            .ok_or(ConfigError::Missing("KOMMO_API_URL"))?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "KOMMO_API_URL",
                value: api_url,
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let kommo = KommoConfig {
            api_url,
            token: env.optional("KOMMO_TOKEN").map(SecretString::from),
            timeout_secs: env.parsed("KOMMO_TIMEOUT_SECS", 10)?,
            payload_format: env.parsed("KOMMO_PAYLOAD_FORMAT", PayloadFormat::default())?,
        };

        let bot = BotConfig {
            system_prompt: env
                .optional("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            fallback_reply: env
                .optional("FALLBACK_REPLY")
                .unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
            dispatch_mode: env.parsed("DISPATCH_MODE", DispatchMode::default())?,
            webhook_token: env.optional("WEBHOOK_TOKEN").map(SecretString::from),
        };

        let logging = LoggingConfig {
            level: env.optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: env.parsed("LOG_FORMAT", LogFormat::Compact)?,
        };

        Ok(Self {
            server,
            openai,
            kommo,
            bot,
            logging,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    // Blank values count as unset
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed_opt<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.optional(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::Invalid {
                    key,
                    value,
                    reason: e.to_string(),
                }),
        }
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        Ok(self.parsed_opt(key)?.unwrap_or(default))
    }
}

// `Ok(false)` when there is no env file to read
fn dotenv_loaded(result: Result<(), dotenvy::Error>) -> Result<bool, ConfigError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::DotEnv(e.to_string())),
    }
}
