use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use garden_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// (key path, rendered value, env variables consulted in order)
type ConfigLine = (&'static str, String, &'static [&'static str]);

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let catalog_path = config
        .catalog
        .path
        .as_deref()
        .map_or_else(|| "<builtin>".to_string(), |path| path.display().to_string());
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    let entries = vec![
        entry("catalog.path", catalog_path, &["GARDEN_CATALOG_PATH"]),
        entry("llm.enabled", config.llm.enabled.to_string(), &["GARDEN_LLM_ENABLED"]),
        entry("llm.api_key", llm_api_key.to_string(), &["GARDEN_LLM_API_KEY", "GEMINI_API_KEY"]),
        entry("llm.base_url", config.llm.base_url.clone(), &["GARDEN_LLM_BASE_URL"]),
        entry("llm.model", config.llm.model.clone(), &["GARDEN_LLM_MODEL"]),
        entry(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["GARDEN_LLM_TIMEOUT_SECS"],
        ),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["GARDEN_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["GARDEN_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["GARDEN_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["GARDEN_LOGGING_LEVEL", "GARDEN_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["GARDEN_LOGGING_FORMAT", "GARDEN_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.into_iter().map(|(key, value, env_keys)| {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        render_line(key, &value, source)
    }));
    lines.push(format!(
        "- personalization = {}",
        if config.llm.personalization_ready() { "ready" } else { "disabled (rule reports only)" }
    ));

    lines.join("\n")
}

fn entry(key: &'static str, value: String, env_keys: &'static [&'static str]) -> ConfigLine {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("garden.toml"), PathBuf::from("config/garden.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
