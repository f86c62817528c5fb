use thiserror::Error;

use crate::sdk::SdkError;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Please configure your API key first")]
    MissingApiKey,
    #[error("Please configure the analytics SDK first")]
    NotInitialized,
    #[error("No experiment is configured")]
    NoExperiment,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to initialize analytics SDK: {0}")]
    SdkInit(SdkError),
    #[error("Failed to initialize experiment: {0}")]
    ExperimentInit(SdkError),
    #[error("Failed to fetch variants: {0}")]
    Resolution(SdkError),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
