use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}
