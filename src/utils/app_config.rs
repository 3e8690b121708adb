/// Application configuration management
/// Stored in <config_dir>/catalog-admin/config.toml

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::http::{BodyEncoding, ClientSettings, PaginationConfig};
use crate::core::schema::{Resource, ResourceSpec};
use crate::utils::helpers::is_valid_base_url;

pub const APP_DIR: &str = "catalog-admin";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Path segment between the base URL and the endpoint, e.g. "v1"
    pub version: String,
    pub page_size: u32,
    /// Request timeout, humantime syntax ("10s", "1m 30s")
    pub timeout: String,
    pub body: BodyEncoding,
    pub pagination: PaginationConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            version: "v1".to_string(),
            page_size: 10,
            timeout: "10s".to_string(),
            body: BodyEncoding::Json,
            pagination: PaginationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceSpec>,
}

fn default_resources() -> Vec<ResourceSpec> {
    vec![ResourceSpec::architecture()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            resources: default_resources(),
        }
    }
}

impl AppConfig {
    /// Get config file path; an explicit path wins over the default location
    pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        let config_dir = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file, creating the parent directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Write a default config file; refuses to overwrite an existing one
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        let config = Self::default();
        config.save_to(path)?;
        Ok(config)
    }

    /// Command-line overrides (`--api`, `--page-size`)
    pub fn apply_overrides(&mut self, base_url: Option<&str>, page_size: Option<u32>) -> Result<()> {
        if let Some(url) = base_url {
            self.api.base_url = url.to_string();
        }
        if let Some(size) = page_size {
            self.api.page_size = size;
        }
        self.validate_api()
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_api()?;
        self.resources()?;
        Ok(())
    }

    fn validate_api(&self) -> Result<()> {
        if !is_valid_base_url(&self.api.base_url) {
            bail!("api.base_url must be an http(s) URL, got '{}'", self.api.base_url);
        }
        if self.api.page_size == 0 {
            bail!("api.page_size must be greater than zero");
        }
        humantime::parse_duration(&self.api.timeout)
            .with_context(|| format!("api.timeout '{}' is not a valid duration", self.api.timeout))?;
        Ok(())
    }

    /// Compile every configured resource
    pub fn resources(&self) -> Result<Vec<Resource>> {
        if self.resources.is_empty() {
            bail!("at least one [[resources]] entry is required");
        }

        let mut seen = HashSet::new();
        self.resources
            .iter()
            .map(|spec| {
                if !seen.insert(spec.name.as_str()) {
                    bail!("duplicate resource name '{}'", spec.name);
                }
                Resource::try_from(spec.clone()).map_err(anyhow::Error::from)
            })
            .collect()
    }

    /// Look up one resource by name
    pub fn resource(&self, name: &str) -> Result<Resource> {
        let spec = self
            .resources
            .iter()
            .find(|r| r.name == name)
            .with_context(|| {
                let known: Vec<&str> = self.resources.iter().map(|r| r.name.as_str()).collect();
                format!("Unknown resource '{}' (configured: {})", name, known.join(", "))
            })?;
        Ok(Resource::try_from(spec.clone())?)
    }

    pub fn to_client_settings(&self) -> Result<ClientSettings> {
        let timeout = humantime::parse_duration(&self.api.timeout)
            .with_context(|| format!("api.timeout '{}' is not a valid duration", self.api.timeout))?;

        Ok(ClientSettings {
            base_url: self.api.base_url.clone(),
            version: self.api.version.clone(),
            page_size: self.api.page_size,
            timeout,
            pagination: self.api.pagination.clone(),
            body: self.api.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::PaginationStyle;
    use crate::core::schema::FieldKind;
    use std::time::Duration;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[api]
base_url = "https://admin.example.com"
version = "v2"
page_size = 25
timeout = "3s"
body = "form"

[api.pagination]
style = "offset"

[[resources]]
name = "firmware"
title = "Firmware"
endpoint = "firmware"
columns = [{ label = "ID", key = "id" }, { label = "Version", key = "version" }]

[[resources.fields]]
name = "version"
max_length = 16
pattern = "[0-9]+\\.[0-9]+"

[[resources.fields]]
name = "stable"
kind = "boolean"
required = false
"#;

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());

        let resources = config.resources().unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "architecture");
        assert_eq!(resources[0].headers(), vec!["ID", "Code"]);
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&write(&dir, SAMPLE)).unwrap();

        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.api.body, BodyEncoding::Form);
        assert_eq!(config.api.pagination.style, PaginationStyle::Offset);
        assert_eq!(config.api.pagination.limit_param, "limit");

        let settings = config.to_client_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.version, "v2");

        let firmware = config.resource("firmware").unwrap();
        assert_eq!(firmware.form.len(), 2);
        assert_eq!(firmware.form.def(1).map(|d| d.kind), Some(FieldKind::Boolean));
        assert!(config.resource("architecture").is_err());
    }

    #[test]
    fn test_partial_api_section_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[api]\nbase_url = \"http://10.0.0.5:9000\"\n");
        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.api.page_size, 10);
        assert_eq!(config.api.timeout, "10s");
        assert_eq!(config.resources, default_resources());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        for bad in [
            "[api]\npage_size = 0\n",
            "[api]\ntimeout = \"soon\"\n",
            "[api]\nbase_url = \"localhost\"\n",
            "resources = []\n",
        ] {
            assert!(AppConfig::load_from(&write(&dir, bad)).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_duplicate_resource_names_rejected() {
        let mut config = AppConfig::default();
        config.resources.push(ResourceSpec::architecture());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate resource name"));
    }

    #[test]
    fn test_bad_field_pattern_rejected() {
        let mut config = AppConfig::default();
        config.resources[0].fields[0].pattern = Some("([a-z".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let mut config = AppConfig::default();
        let code = config.resources[0].fields[0].clone();
        config.resources[0].fields.push(code);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("field 'code' is declared more than once"));
    }

    #[test]
    fn test_init_then_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let written = AppConfig::init(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), written);
        assert!(AppConfig::init(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("https://staging.example.com"), Some(50)).unwrap();
        assert_eq!(config.api.base_url, "https://staging.example.com");
        assert_eq!(config.api.page_size, 50);

        assert!(config.apply_overrides(None, Some(0)).is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom.toml");
        assert_eq!(AppConfig::config_path(Some(&path)).unwrap(), path);
    }
}
