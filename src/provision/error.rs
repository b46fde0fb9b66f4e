use std::error::Error as StdError;
use thiserror::Error;

use super::saga::Stage;
use crate::collect::CollectError;
use crate::remote::RemoteError;

/// A compensating action that did not complete.
///
/// Never returned on its own: it rides along with the failure that
/// triggered compensation.
#[derive(Debug, Error)]
#[error("failed to delete repository {target}")]
pub struct CompensationFailed {
    /// Repository path left behind; needs manual cleanup.
    pub target: String,
    #[source]
    pub source: RemoteError,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid request: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("failed to create repository {name}")]
    CreateFailed {
        name: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to collect scaffold files{}", cleanup_note(.cleanup))]
    Collection {
        #[source]
        source: CollectError,
        cleanup: Vec<CompensationFailed>,
    },

    #[error("failed to commit files to {path}{}", cleanup_note(.cleanup))]
    CommitFailed {
        path: String,
        #[source]
        source: RemoteError,
        cleanup: Vec<CompensationFailed>,
    },

    #[error("failed to delete repository {path}")]
    Teardown {
        path: String,
        #[source]
        source: RemoteError,
    },
}

// Cleanup failures are not part of the source chain, so their causes are
// spelled out inline.
fn cleanup_note(cleanup: &[CompensationFailed]) -> String {
    cleanup
        .iter()
        .map(|c| format!("; cleanup also failed: {}", error_chain(c)))
        .collect()
}

/// `err` and each of its sources, joined with `: `.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut msg = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        msg.push_str(": ");
        msg.push_str(&e.to_string());
        cause = e.source();
    }
    msg
}

impl ProvisionError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ProvisionError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Compensation failures attached to this error, if any.
    pub fn cleanup_failures(&self) -> &[CompensationFailed] {
        match self {
            ProvisionError::Collection { cleanup, .. }
            | ProvisionError::CommitFailed { cleanup, .. } => cleanup,
            _ => &[],
        }
    }

    /// Terminal stage the attempt ended in.
    pub fn stage(&self) -> Stage {
        match self {
            ProvisionError::Validation { .. } | ProvisionError::Teardown { .. } => Stage::Idle,
            ProvisionError::CreateFailed { .. } => Stage::CreateFailed,
            _ if self.cleanup_failures().is_empty() => Stage::Compensated,
            _ => Stage::CompensationFailed,
        }
    }
}

/// Failure between `Created` and `Published`, before compensation ran.
#[derive(Debug)]
pub(crate) enum PublishFailure {
    Collection(CollectError),
    Commit { path: String, source: RemoteError },
}

impl PublishFailure {
    pub(crate) fn with_cleanup(self, cleanup: Vec<CompensationFailed>) -> ProvisionError {
        match self {
            PublishFailure::Collection(source) => ProvisionError::Collection { source, cleanup },
            PublishFailure::Commit { path, source } => ProvisionError::CommitFailed {
                path,
                source,
                cleanup,
            },
        }
    }
}

impl std::fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishFailure::Collection(e) => write!(f, "{}", error_chain(e)),
            PublishFailure::Commit { path, source } => {
                write!(f, "commit to {path}: {}", error_chain(source))
            }
        }
    }
}
