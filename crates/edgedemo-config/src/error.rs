use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "Missing or invalid settings: {}\n\
        Set them in edgedemo.yaml, ~/.config/edgedemo/config.yaml or through\n\
        STACKPATH_CLIENT_ID, STACKPATH_CLIENT_SECRET, STACKPATH_STACK,\n\
        EDGEDEMO_DOMAIN and EDGEDEMO_SUBDOMAIN",
        .0.join(", ")
    )]
    Invalid(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
