use std::env;
use std::fs;
use std::path::PathBuf;

use dirs_next::config_dir;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct MockgptConfig {
    #[serde(default = "default_port")]
    pub port: Option<u16>,
}

fn default_port() -> Option<u16> {
    Some(5000)
}

impl Default for MockgptConfig {
    fn default() -> Self {
        MockgptConfig {
            port: default_port(),
        }
    }
}

static CONFIG: OnceCell<MockgptConfig> = OnceCell::new();

fn get_config_path() -> PathBuf {
    let mut path = config_dir().unwrap_or_else(|| env::current_dir().unwrap());
    path.push("mockgpt");
    path.push("mockgpt.toml");
    path
}

fn load_config_file() -> MockgptConfig {
    let path = get_config_path();
    if path.exists() {
        let content = fs::read_to_string(&path).unwrap_or_default();
        toml::from_str(&content).unwrap_or_default()
    } else {
        // First run: write the defaults so they are discoverable.
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let default = MockgptConfig::default();
        let toml_str = toml::to_string_pretty(&default).unwrap_or_default();
        let _ = fs::write(&path, toml_str);
        default
    }
}

fn get_config() -> &'static MockgptConfig {
    CONFIG.get_or_init(load_config_file)
}

pub fn get_port() -> u16 {
    get_config()
        .port
        .or_else(|| env::var("MOCKGPT_PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(5000)
}
