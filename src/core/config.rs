use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use super::collect::CollectLimits;
use super::currency::Currency;

pub const DEFAULT_BASE_URL: &str = "https://books.toscrape.com/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_pages: u32,
    pub max_consecutive_failures: u32,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            max_pages: 50,
            max_consecutive_failures: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn limits(&self) -> CollectLimits {
        CollectLimits {
            max_pages: self.max_pages,
            max_consecutive_failures: self.max_consecutive_failures.max(1),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the export files are written to; the working directory if unset.
    pub directory: Option<String>,
    pub chart_max_products: usize,
    /// TrueType font used for chart text; common system fonts are tried if unset.
    pub chart_font: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: None,
            chart_max_products: 30,
            chart_font: None,
        }
    }
}

impl OutputConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_currency() -> Currency {
    Currency::Kes
}

fn default_count() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            count: default_count(),
            scraper: ScraperConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "pricescrape", "pricescrape")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.count == 0 {
            anyhow::bail!("count must be a positive integer");
        }
        if self.scraper.max_pages == 0 {
            anyhow::bail!("scraper.max_pages must be a positive integer");
        }
        if self.scraper.timeout_secs == 0 {
            anyhow::bail!("scraper.timeout_secs must be a positive integer");
        }
        reqwest::Url::parse(&self.scraper.base_url)
            .with_context(|| format!("Invalid scraper.base_url: {}", self.scraper.base_url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "usd"
count: 25
scraper:
  base_url: "http://localhost:8080/"
  timeout_secs: 3
  max_pages: 4
output:
  directory: "out"
  chart_max_products: 12
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, Currency::Usd);
        assert_eq!(config.count, 25);
        assert_eq!(config.scraper.base_url, "http://localhost:8080/");
        assert_eq!(config.scraper.timeout(), Duration::from_secs(3));
        assert_eq!(config.scraper.max_pages, 4);
        // Unset fields keep their defaults
        assert_eq!(config.scraper.max_consecutive_failures, 3);
        assert_eq!(config.scraper.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.output.directory(), PathBuf::from("out"));
        assert_eq!(config.output.chart_max_products, 12);
        assert!(config.output.chart_font.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.currency, Currency::Kes);
        assert_eq!(config.count, 10);
        assert_eq!(config.scraper.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output.directory(), PathBuf::from("."));
    }

    #[test]
    fn test_unsupported_currency_is_rejected() {
        let result = serde_yaml::from_str::<AppConfig>("currency: \"XYZ\"\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("XYZ"));
    }

    #[test]
    fn test_load_from_path_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "count: 0").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("count must be a positive integer"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scraper:\n  base_url: \"not a url\"").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid scraper.base_url"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scraper:\n  timeout_secs: 0").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(
            err.to_string()
                .contains("scraper.timeout_secs must be a positive integer")
        );
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Failed to read config file")
        );
    }

    #[test]
    fn test_limits_never_allow_zero_failures() {
        let scraper = ScraperConfig {
            max_consecutive_failures: 0,
            ..ScraperConfig::default()
        };
        assert_eq!(scraper.limits().max_consecutive_failures, 1);
        assert_eq!(scraper.limits().max_pages, 50);
    }
}
