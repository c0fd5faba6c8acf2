//! Error taxonomy shared by the core and every pipeline implementation.

use std::path::PathBuf;

use crate::contract::Stage;

/// Result alias used throughout genapi.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while resolving or running a pipeline.
///
/// An unknown output kind is deliberately absent: it is not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No resolution candidate produced a pipeline.
    #[error("pipeline `{0}` not found (tried the `genapi-{0}` package and the path `{0}`)")]
    PipelineNotFound(String),

    /// A candidate exists but cannot be turned into a pipeline.
    #[error("pipeline module at {} is malformed: {reason}", path.display())]
    MalformedPipeline {
        /// The manifest file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A pipeline was invoked for a stage it does not provide.
    #[error("pipeline `{pipeline}` does not provide the `{stage}` stage")]
    ContractViolation {
        /// Name of the pipeline.
        pipeline: String,
        /// The missing stage.
        stage: Stage,
    },

    /// A stage raised while running; the remaining stages of the run are skipped.
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        /// The stage that failed.
        stage: Stage,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The configuration is missing or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The API description could not be downloaded.
    #[error("failed to fetch {uri}: {reason}")]
    Fetch {
        /// The requested URI.
        uri: String,
        /// Transport error or HTTP status.
        reason: String,
    },

    /// The API description is not valid JSON/YAML or not a known document.
    #[error("failed to parse API description: {0}")]
    Parse(String),

    /// Reading or writing a file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized or synthesized.
    #[error("serialization error: {0}")]
    Serialize(String),
}

impl Error {
    /// Wraps `self` as the failure of `stage`, unless it already carries a stage
    /// or is a contract violation (which names its own stage).
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::StageFailed { .. } | Self::ContractViolation { .. } => self,
            other => Self::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Shorthand for an I/O failure at `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The stage this error was raised in, if it was raised inside a run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } | Self::ContractViolation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stage_wraps_once() {
        let err = Error::Parse("bad schema".into()).in_stage(Stage::Parser);
        assert_eq!(err.stage(), Some(Stage::Parser));

        let rewrapped = err.in_stage(Stage::Compiler);
        assert_eq!(rewrapped.stage(), Some(Stage::Parser));
        assert_eq!(
            rewrapped.to_string(),
            "parser stage failed: failed to parse API description: bad schema"
        );
    }

    #[test]
    fn test_contract_violation_keeps_its_stage() {
        let err = Error::ContractViolation {
            pipeline: "demo".into(),
            stage: Stage::Generate,
        }
        .in_stage(Stage::Compiler);
        assert_eq!(err.stage(), Some(Stage::Generate));
        assert!(matches!(err, Error::ContractViolation { .. }));
    }
}
