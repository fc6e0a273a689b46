// Error taxonomy for the seeding pipeline
//
// Config errors are fatal at startup. Storage errors raised inside a batch
// write are retried by the writer; everything else escalates to a phase
// failure, which aborts the run.

use std::path::PathBuf;
use thiserror::Error;

use crate::entities::Entity;
use crate::orchestrator::PipelineState;
use crate::storage::EntityCounts;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field}: min ({min}) must not exceed max ({max})")]
    InvertedRange {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field}: min must be at least 1")]
    EmptyRange { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("account_owner_ratio must be within (0, 1], got {0}")]
    OwnerRatio(f64),

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Row rejected by a key or foreign-key rule
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Backend refused or could not complete the call
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("storage call failed: {0}")]
    Storage(#[from] StorageError),

    #[error("batch {batch} of {entity} failed after {attempts} attempts: {source}")]
    BatchWrite {
        entity: Entity,
        batch: usize,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("worker {worker} failed: {message}")]
    Worker { worker: usize, message: String },

    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    /// Any of the above, raised while a phase was running
    #[error("{phase} failed: {source}")]
    Phase {
        phase: PipelineState,
        /// Row counts still in storage when the phase failed (None if they could not be read)
        persisted: Option<EntityCounts>,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Phase that was running when the error was raised, if known
    pub fn phase(&self) -> Option<PipelineState> {
        match self {
            PipelineError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Rows left behind by a failed run
    pub fn persisted(&self) -> Option<&EntityCounts> {
        match self {
            PipelineError::Phase { persisted, .. } => persisted.as_ref(),
            _ => None,
        }
    }

    /// Innermost pipeline error (unwraps phase wrappers)
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}
