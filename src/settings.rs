use std::{fs, path::PathBuf, sync::Mutex};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "https://downloads.khinsider.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub host_url: String,
    #[serde(default)]
    pub proxy_enabled: bool,
    #[serde(default)]
    pub proxy_host: String,
    #[serde(default)]
    pub proxy_port: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host_url: DEFAULT_HOST.into(),
            proxy_enabled: false,
            proxy_host: String::new(),
            proxy_port: String::new(),
        }
    }
}

impl AppSettings {
    /// Proxy address to route requests through, when one is configured.
    pub fn proxy_url(&self) -> Option<String> {
        if !self.proxy_enabled {
            return None;
        }
        let host = self.proxy_host.trim();
        if host.is_empty() {
            return None;
        }
        let port = self.proxy_port.trim();
        if port.is_empty() {
            Some(format!("http://{}", host))
        } else {
            Some(format!("http://{}:{}", host, port))
        }
    }
}

pub struct AppState {
    settings_path: PathBuf,
    pub settings: Mutex<AppSettings>,
}

impl AppState {
    pub fn init() -> Self {
        let path = settings_file_path();
        let settings = load_settings(&path).unwrap_or_default();
        Self {
            settings_path: path,
            settings: Mutex::new(settings),
        }
    }

    pub fn current(&self) -> AppSettings {
        self.settings.lock().unwrap().clone()
    }

    pub fn persist(&self, settings: AppSettings) -> anyhow::Result<()> {
        let mut guard = self.settings.lock().unwrap();
        let mut updated = settings;
        updated.host_url = normalize_host(&updated.host_url);
        *guard = updated.clone();
        save_settings(&self.settings_path, &updated)
    }
}

fn settings_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("khinsider-client")
        .join("settings.json")
}

fn load_settings(path: &PathBuf) -> anyhow::Result<AppSettings> {
    let contents = fs::read_to_string(path)?;
    let mut settings: AppSettings = serde_json::from_str(&contents)?;
    settings.host_url = normalize_host(&settings.host_url);
    Ok(settings)
}

fn save_settings(path: &PathBuf, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let json = serde_json::to_string_pretty(settings).context("serialize settings")?;
    fs::write(path, json).context("write settings")
}

pub fn normalize_host(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        DEFAULT_HOST.into()
    } else {
        trimmed.trim_end_matches('/').to_string()
    }
}
