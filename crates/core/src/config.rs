use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub name: String,
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_user_id: Uuid,
    pub access_token: SecretString,
    pub api_base_url: String,
    pub command_prefix: String,
    pub stamps: StampConfig,
}

/// Reaction stamp ids for this deployment. The platform assigns stamp ids
/// per workspace, so they are configuration, not constants. A nil id means
/// "not configured" and the stamp post is skipped.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct StampConfig {
    #[serde(default)]
    pub ack: Uuid,
    #[serde(default)]
    pub question: Uuid,
    #[serde(default)]
    pub explosion: Uuid,
    #[serde(default)]
    pub no_entry: Uuid,
    #[serde(default)]
    pub wave: Uuid,
    #[serde(default)]
    pub clap: Uuid,
    #[serde(default)]
    pub cheer: Uuid,
    #[serde(default)]
    pub face_positive: Uuid,
    #[serde(default)]
    pub face_negative: Uuid,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_port: u16,
    pub shutdown_grace_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub access_token: Option<String>,
    pub command_prefix: Option<String>,
    pub api_base_url: Option<String>,
    pub admin_user_id: Option<Uuid>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("config file `{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("config file references `{var}`, which is not set in the environment")]
    MissingEnvInterpolation { var: String },
    #[error("unclosed `${{...}}` interpolation in config file")]
    UnterminatedInterpolation,
    #[error("environment override {key}={value} could not be parsed")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "facebot".to_string(),
                id: Uuid::nil(),
                user_id: Uuid::nil(),
                admin_user_id: Uuid::nil(),
                access_token: String::new().into(),
                api_base_url: "https://chat.example.com/api/v3".to_string(),
                command_prefix: "/".to_string(),
                stamps: StampConfig::default(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_port: 8080,
                shutdown_grace_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "log format must be compact, pretty, or json (got `{other}`)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match locate_config_file(options.config_path.as_deref()) {
            Some(path) => config.apply_patch(load_config_file(&path)?),
            None if options.require_file => {
                return Err(ConfigError::MissingConfigFile(
                    options.config_path.unwrap_or_else(|| PathBuf::from("facebot.toml")),
                ));
            }
            None => {}
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(bot) = patch.bot {
            if let Some(name) = bot.name {
                self.bot.name = name;
            }
            if let Some(id) = bot.id {
                self.bot.id = id;
            }
            if let Some(user_id) = bot.user_id {
                self.bot.user_id = user_id;
            }
            if let Some(admin_user_id) = bot.admin_user_id {
                self.bot.admin_user_id = admin_user_id;
            }
            if let Some(access_token_value) = bot.access_token {
                self.bot.access_token = access_token_value.into();
            }
            if let Some(api_base_url) = bot.api_base_url {
                self.bot.api_base_url = api_base_url;
            }
            if let Some(command_prefix) = bot.command_prefix {
                self.bot.command_prefix = command_prefix;
            }
            if let Some(stamps) = bot.stamps {
                self.bot.stamps = stamps;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_port) = server.health_port {
                self.server.health_port = health_port;
            }
            if let Some(shutdown_grace_secs) = server.shutdown_grace_secs {
                self.server.shutdown_grace_secs = shutdown_grace_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FACEBOT_BOT_NAME") {
            self.bot.name = value;
        }
        if let Some(value) = read_env("FACEBOT_BOT_ID") {
            self.bot.id = parse_env("FACEBOT_BOT_ID", &value)?;
        }
        if let Some(value) = read_env("FACEBOT_BOT_USER_ID") {
            self.bot.user_id = parse_env("FACEBOT_BOT_USER_ID", &value)?;
        }
        if let Some(value) = read_env("FACEBOT_ADMIN_USER_ID") {
            self.bot.admin_user_id = parse_env("FACEBOT_ADMIN_USER_ID", &value)?;
        }
        if let Some(value) = read_env("FACEBOT_BOT_ACCESS_TOKEN") {
            self.bot.access_token = value.into();
        }
        if let Some(value) = read_env("FACEBOT_API_BASE_URL") {
            self.bot.api_base_url = value;
        }
        if let Some(value) = read_env("FACEBOT_COMMAND_PREFIX") {
            self.bot.command_prefix = value;
        }

        if let Some(value) = read_env("FACEBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FACEBOT_SERVER_HEALTH_PORT") {
            self.server.health_port = parse_env("FACEBOT_SERVER_HEALTH_PORT", &value)?;
        }
        if let Some(value) = read_env("FACEBOT_SERVER_SHUTDOWN_GRACE_SECS") {
            self.server.shutdown_grace_secs =
                parse_env("FACEBOT_SERVER_SHUTDOWN_GRACE_SECS", &value)?;
        }

        let log_level =
            read_env("FACEBOT_LOGGING_LEVEL").or_else(|| read_env("FACEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FACEBOT_LOGGING_FORMAT").or_else(|| read_env("FACEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(access_token) = overrides.access_token {
            self.bot.access_token = access_token.into();
        }
        if let Some(command_prefix) = overrides.command_prefix {
            self.bot.command_prefix = command_prefix;
        }
        if let Some(api_base_url) = overrides.api_base_url {
            self.bot.api_base_url = api_base_url;
        }
        if let Some(admin_user_id) = overrides.admin_user_id {
            self.bot.admin_user_id = admin_user_id;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bot(&self.bot)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn locate_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => {
            ["facebot.toml", "config/facebot.toml"].iter().map(Path::new).find_map(|candidate| {
                candidate.exists().then(|| candidate.to_path_buf())
            })
        }
    }
}

fn load_config_file(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let expanded = expand_env_refs(&raw)?;
    toml::from_str(&expanded)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands every `${VAR}` reference in the raw config text before it reaches
/// the TOML parser. A reference to an unset variable is an error rather than
/// an empty string.
fn expand_env_refs(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((literal, expr)) = rest.split_once("${") {
        output.push_str(literal);
        let Some((var, tail)) = expr.split_once('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = tail;
    }
    output.push_str(rest);

    Ok(output)
}

fn validate_bot(bot: &BotConfig) -> Result<(), ConfigError> {
    if bot.name.trim().is_empty() {
        return Err(ConfigError::Validation("bot.name must be set and non-empty".to_string()));
    }

    let prefix = &bot.command_prefix;
    if prefix.is_empty() {
        return Err(ConfigError::Validation(
            "bot.command_prefix must be set and non-empty".to_string(),
        ));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "bot.command_prefix must not contain whitespace".to_string(),
        ));
    }

    if bot.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "bot.access_token is required (issue one from the platform's bot console)"
                .to_string(),
        ));
    }

    let url = bot.api_base_url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "bot.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_port == 0 {
        return Err(ConfigError::Validation("server.health_port must be non-zero".to_string()));
    }
    if server.shutdown_grace_secs == 0 {
        return Err(ConfigError::Validation(
            "server.shutdown_grace_secs must be non-zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    match logging.level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be trace, debug, info, warn, or error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    bot: Option<BotPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    name: Option<String>,
    id: Option<Uuid>,
    user_id: Option<Uuid>,
    admin_user_id: Option<Uuid>,
    access_token: Option<String>,
    api_base_url: Option<String>,
    command_prefix: Option<String>,
    stamps: Option<StampConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_port: Option<u16>,
    shutdown_grace_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
