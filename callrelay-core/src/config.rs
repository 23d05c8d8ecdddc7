use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Environment variables that override file values.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("http.port", "PORT"),
    ("http.public_dir", "PUBLIC_DIR"),
    ("crm.api_key", "GHL_API_KEY"),
    ("crm.location_id", "GHL_LOCATION_ID"),
    ("board.api_key", "MONDAY_API_KEY"),
    ("board.board_ids", "MONDAY_BOARD_IDS"),
];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub board: BoardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrmConfig {
    pub api_key: Option<String>,
    pub location_id: Option<String>,
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,
    #[serde(default = "default_crm_api_version")]
    pub api_version: String,
    #[serde(default = "default_contact_page_limit")]
    pub contact_page_limit: u32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            location_id: None,
            base_url: default_crm_base_url(),
            api_version: default_crm_api_version(),
            contact_page_limit: default_contact_page_limit(),
        }
    }
}

impl CrmConfig {
    /// API key and location id, or `None` if either is missing or blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let api_key = non_blank(self.api_key.as_deref())?;
        let location_id = non_blank(self.location_id.as_deref())?;
        Some((api_key, location_id))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub api_key: Option<String>,
    /// Comma-separated board ids, as they arrive from the environment.
    pub board_ids: Option<String>,
    #[serde(default = "default_board_base_url")]
    pub base_url: String,
    #[serde(default = "default_board_api_version")]
    pub api_version: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            board_ids: None,
            base_url: default_board_base_url(),
            api_version: default_board_api_version(),
            page_size: default_page_size(),
        }
    }
}

impl BoardConfig {
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Board ids in configured order, trimmed, blanks dropped.
    pub fn board_ids(&self) -> Vec<String> {
        self.board_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl RelayConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name(path).required(false));
        // blank variables are treated as unset, so they never mask a file value
        for (key, var) in ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }
        builder.build()?.try_deserialize()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_crm_base_url() -> String {
    "https://services.leadconnectorhq.com".to_string()
}

fn default_crm_api_version() -> String {
    "2021-07-28".to_string()
}

fn default_contact_page_limit() -> u32 {
    100
}

fn default_board_base_url() -> String {
    "https://api.monday.com/v2".to_string()
}

fn default_board_api_version() -> String {
    "2024-10".to_string()
}

fn default_page_size() -> u32 {
    500
}
