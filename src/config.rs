use crate::error::{MigrateError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business: BusinessDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_register_path")]
    pub register_path: String,
    #[serde(default = "default_find_person_path")]
    pub find_person_path: String,
    #[serde(default = "default_catalogs_path")]
    pub catalogs_path: String,
    #[serde(default)]
    pub timeout: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub default_secs: u64,
    pub register_secs: u64,
    pub catalogs_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: 30,
            register_secs: 60,
            catalogs_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }

    pub fn register_timeout(&self) -> Duration {
        Duration::from_secs(self.register_secs)
    }

    pub fn catalogs_timeout(&self) -> Duration {
        Duration::from_secs(self.catalogs_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub url: String,
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// How long before the real expiry a cached token is refreshed proactively.
    #[serde(default = "default_refresh_threshold_ms")]
    pub refresh_threshold_ms: i64,
    #[serde(default = "default_auth_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Static business defaults baked into every registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusinessDefaults {
    pub work_area_code: i64,
    pub cam_location: String,
    pub cam_sub_location: String,
    pub description_location: String,
    pub detected_by_employee: i64,
    pub created_by_employee: i64,
    pub employee_person_code_created: i64,
    pub employee_person_code_detected: i64,
    pub created_by_user: String,
}

impl Default for BusinessDefaults {
    fn default() -> Self {
        Self {
            work_area_code: 22352,
            cam_location: "LCD".to_string(),
            cam_sub_location: "CAB".to_string(),
            description_location: "FILIAL".to_string(),
            detected_by_employee: 1713109047,
            created_by_employee: 1713109047,
            employee_person_code_created: 69265,
            employee_person_code_detected: 69265,
            created_by_user: "FR0M".to_string(),
        }
    }
}

/// Fully joined endpoint URLs derived from the API configuration.
#[derive(Debug, Clone)]
pub struct ApiUrls {
    pub register: String,
    pub find_person: String,
    pub catalogs: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!("failed to read config file '{}': {}", path, e))
        })?;

        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Credentials come from the environment (or a .env file); the remaining
    /// environment overrides are optional conveniences for deployments.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = env::var("API_URL_BASE") {
            self.api.base_url = value;
        }
        if let Ok(value) = env::var("AUTH_URL") {
            self.auth.url = value;
        }
        if let Ok(value) = env::var("AUTH_CLIENT_ID") {
            self.auth.client_id = value;
        }
        if let Ok(value) = env::var("AUTH_USERNAME") {
            self.auth.username = value;
        }
        if let Ok(value) = env::var("AUTH_PASSWORD") {
            self.auth.password = value;
        }

        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err(MigrateError::Config(
                "AUTH_USERNAME and AUTH_PASSWORD must be provided via environment or config.toml"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn urls(&self) -> ApiUrls {
        let base = self.base_url.trim_end_matches('/');
        ApiUrls {
            register: format!("{}{}", base, self.register_path),
            find_person: format!("{}{}", base, self.find_person_path),
            catalogs: format!("{}{}", base, self.catalogs_path),
        }
    }
}

fn default_register_path() -> String {
    "/caseServices/api/v1/migrate/createUpdateNovelty".to_string()
}

fn default_find_person_path() -> String {
    "/subsidiaryServices/api/v1/external/getPersonByDocumentAndType".to_string()
}

fn default_catalogs_path() -> String {
    "/subsidiaryServices/api/v1/catalogs/getCatalogsFil".to_string()
}

fn default_refresh_threshold_ms() -> i64 {
    300_000 // 5 minutes before expiration
}

fn default_auth_timeout_secs() -> u64 {
    30
}
