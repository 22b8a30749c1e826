//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and repositories, and pairs every
//! rejected participant command with the name of whoever sent it.
use thiserror::Error;
use tokio::sync::oneshot;

use expedition_core::{
    ConfigError, ConfirmRejection, ErrorSeverity, GameError, JoinRejection, QueueRejection,
    StartError,
};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("encounter worker command channel closed")]
    CommandChannelClosed,

    #[error("encounter worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("encounter worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime requires a content pack before building")]
    MissingContent,

    #[error("invalid combat configuration")]
    Config(#[from] ConfigError),

    #[error("cannot start encounter: {0}")]
    Start(#[from] StartError),

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl RuntimeError {
    /// The rejection behind this error, if a participant command was refused.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// A participant command the encounter refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("@{participant}: {reason}")]
pub struct Rejection {
    /// Display name of the participant who sent the command.
    pub participant: String,
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn new(participant: impl Into<String>, reason: impl Into<RejectionReason>) -> Self {
        Self {
            participant: participant.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error(transparent)]
    Join(#[from] JoinRejection),
    #[error(transparent)]
    Queue(#[from] QueueRejection),
    #[error(transparent)]
    Confirm(#[from] ConfirmRejection),
}

impl GameError for RejectionReason {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Join(e) => e.severity(),
            Self::Queue(e) => e.severity(),
            Self::Confirm(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Join(e) => e.error_code(),
            Self::Queue(e) => e.error_code(),
            Self::Confirm(e) => e.error_code(),
        }
    }
}
