use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_city_name() -> String {
    "Islamabad".to_string()
}
fn default_latitude() -> f64 {
    33.6938
}
fn default_longitude() -> f64 {
    73.0651
}
fn default_calc_method() -> String {
    "MuslimWorldLeague".to_string()
}
fn default_madhab() -> String {
    "Hanafi".to_string()
}
fn default_timezone_offset() -> i32 {
    300
}
fn default_cities() -> Vec<CityConfig> {
    vec![CityConfig::default()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MosqueConfig {
    /// Mosque followed when no `--mosque` is given.
    #[serde(default)]
    pub default_id: Option<String>,
}

/// Coordinates and calculation settings for one city a mosque can be in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default = "default_city_name")]
    pub name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_calc_method")]
    pub calc_method: String,
    #[serde(default = "default_madhab")]
    pub madhab: String,
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: i32, // minutes from UTC
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: default_city_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            calc_method: default_calc_method(),
            madhab: default_madhab(),
            timezone_offset: default_timezone_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Verbose diagnostics in the CLI output.
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub mosque: MosqueConfig,
    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            remote: RemoteConfig::default(),
            mosque: MosqueConfig::default(),
            cities: default_cities(),
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "masjid")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("masjid.db"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Reading {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Parsing config.toml")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(&path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
