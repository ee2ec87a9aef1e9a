use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("expression '{expression}' contains invalid factor '{factor}'")]
    InvalidFactor { expression: String, factor: String },
    #[error("reaction '{reaction}' has non-integral coefficient {coefficient} for '{species}'")]
    InvalidCoefficient {
        reaction: String,
        species: String,
        coefficient: f64,
    },
    #[error("reaction '{reaction}' has invalid rate constant {rate}")]
    InvalidRate { reaction: String, rate: f64 },
    #[error("duplicate reaction name '{0}'")]
    DuplicateReaction(String),
    #[error("species '{0}' is initialised more than once")]
    DuplicateSpecies(String),
    #[error("species '{species}' has negative initial count {count}")]
    NegativeCount { species: String, count: i64 },
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("firing reaction '{reaction}' would overflow the count of '{species}'")]
    CountOverflow { reaction: String, species: String },
    #[error("total propensity is no longer finite at time {time}")]
    NonFinitePropensity { time: f64 },
    #[error("trajectory sink failed: {0}")]
    Sink(#[from] SinkError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid network description: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("receiver disconnected")]
    Disconnected,
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("observation rejected: {0}")]
    Rejected(String),
}

impl SimError {
    /// True for errors raised while building a network, before any step runs.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            SimError::Sink(_)
                | SimError::CountOverflow { .. }
                | SimError::NonFinitePropensity { .. }
        )
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
