use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PIX_URL_TEMPLATE: &str = "https://www.bcb.gov.br/content/estabilidadefinanceira/participantes_pix/lista-participantes-instituicoes-em-adesao-pix-{date}.csv";
pub const DEFAULT_STR_URL: &str =
    "https://www.bcb.gov.br/content/estabilidadefinanceira/str1/ParticipantesSTR.csv";

/// Placeholder replaced by the candidate date (YYYYMMDD)
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Environment override for the artifact directory
pub const DATA_DIR_ENV: &str = "ISPB_DATA_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pix: PixSourceConfig,
    #[serde(rename = "str")]
    pub str_source: StrSourceConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixSourceConfig {
    pub url_template: String,
    /// How many calendar days back from today to probe
    pub days_back: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrSourceConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for PixSourceConfig {
    fn default() -> Self {
        PixSourceConfig {
            url_template: DEFAULT_PIX_URL_TEMPLATE.to_string(),
            days_back: 10,
        }
    }
}

impl Default for StrSourceConfig {
    fn default() -> Self {
        StrSourceConfig {
            url: DEFAULT_STR_URL.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            user_agent: format!("ispb-registry/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Load from an optional TOML file, then apply `ISPB_DATA_DIR`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    PipelineError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml(&content)?
            }
            None => PipelineConfig::default(),
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.storage.data_dir = PathBuf::from(dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pix.url_template.contains(DATE_PLACEHOLDER) {
            return Err(PipelineError::Config(format!(
                "pix.url_template must contain {}",
                DATE_PLACEHOLDER
            )));
        }
        if self.pix.days_back == 0 {
            return Err(PipelineError::Config("pix.days_back must be at least 1".to_string()));
        }
        if self.http.timeout_secs == 0 {
            return Err(PipelineError::Config("http.timeout_secs must be at least 1".to_string()));
        }
        if self.str_source.url.trim().is_empty() {
            return Err(PipelineError::Config("str.url must not be empty".to_string()));
        }
        Ok(())
    }
}
