//! Common error infrastructure for expedition-core.
//!
//! Domain errors live next to the operation they validate (`QueueRejection`
//! in the turn coordinator, `JoinRejection` in the wave orchestrator, ...).
//! This module holds the shared classification used for logging and for
//! deciding whether a failure is a participant's mistake or an operator's.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same participant may succeed with a different command
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: the encounter cannot start or continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Examples: cannot afford the ability yet, target not found
    Recoverable,

    /// Examples: unknown ability, not a participant
    Validation,

    /// These indicate bugs and should be investigated.
    Internal,

    /// Examples: empty ability catalog, invalid configuration
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug or unusable setup.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all expedition-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Display text is shown to participants, so keep it short and specific
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static identifier for this error variant, stable across
    /// releases so hosts can match on it.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
