use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use facebot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("configuration error: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let line = |key_path: &str, env_key: &str, value: &str| {
        let source =
            field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        format!("- {key_path} = {value} (source: {source})")
    };

    let bot = &config.bot;
    let server = &config.server;
    let logging = &config.logging;
    let lines = [
        "effective configuration (precedence: env > file > default):".to_string(),
        line("bot.name", "FACEBOT_BOT_NAME", &bot.name),
        line("bot.id", "FACEBOT_BOT_ID", &bot.id.to_string()),
        line("bot.user_id", "FACEBOT_BOT_USER_ID", &bot.user_id.to_string()),
        line("bot.admin_user_id", "FACEBOT_ADMIN_USER_ID", &bot.admin_user_id.to_string()),
        line(
            "bot.access_token",
            "FACEBOT_BOT_ACCESS_TOKEN",
            &redact_token(bot.access_token.expose_secret()),
        ),
        line("bot.api_base_url", "FACEBOT_API_BASE_URL", &bot.api_base_url),
        line("bot.command_prefix", "FACEBOT_COMMAND_PREFIX", &bot.command_prefix),
        line("server.bind_address", "FACEBOT_SERVER_BIND_ADDRESS", &server.bind_address),
        line("server.health_port", "FACEBOT_SERVER_HEALTH_PORT", &server.health_port.to_string()),
        line(
            "server.shutdown_grace_secs",
            "FACEBOT_SERVER_SHUTDOWN_GRACE_SECS",
            &server.shutdown_grace_secs.to_string(),
        ),
        line("logging.level", "FACEBOT_LOGGING_LEVEL", &logging.level),
        line("logging.format", "FACEBOT_LOGGING_FORMAT", &format!("{:?}", logging.format)),
    ];

    lines.join("\n")
}

fn redact_token(token: &str) -> String {
    if token.is_empty() { "<unset>" } else { "<redacted>" }.to_string()
}

fn detect_config_path() -> Option<PathBuf> {
    ["facebot.toml", "config/facebot.toml"]
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    fs::read_to_string(path?).ok()?.parse().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env {env_key}");
    }

    match file_doc {
        Some(doc) if contains_path(doc, key_path) => {
            let shown = file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            format!("file {shown}")
        }
        _ => "default".to_string(),
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |table, key| table.get(key)).is_some()
}
