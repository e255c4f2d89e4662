//! Error types for the object pool

use crate::handle::PoolHandle;
use thiserror::Error;

/// Boxed error produced by a factory or hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Pool was built without a factory")]
    MissingFactory,

    #[error("Handle {0} was already released")]
    AlreadyReleased(PoolHandle),

    #[error("Handle {0} is stale - its instance was checked out again")]
    StaleHandle(PoolHandle),

    #[error("Handle {0} does not belong to this pool")]
    UnknownHandle(PoolHandle),

    #[error("Factory failed to create an instance")]
    Factory(#[source] BoxError),

    #[error("{stage} hook failed")]
    Hook {
        stage: HookStage,
        #[source]
        source: BoxError,
    },

    #[cfg(feature = "metrics")]
    #[error("Metrics export failed")]
    Metrics(#[from] prometheus::Error),
}

impl PoolError {
    /// Whether the error is a caller misuse of the acquire/release protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            PoolError::AlreadyReleased(_) | PoolError::StaleHandle(_) | PoolError::UnknownHandle(_)
        )
    }

    pub(crate) fn hook(stage: HookStage, source: BoxError) -> Self {
        PoolError::Hook { stage, source }
    }
}

/// Point in the protocol at which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Acquire,
    Release,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookStage::Acquire => f.write_str("Acquire"),
            HookStage::Release => f.write_str("Release"),
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violation_classification() {
        let handle = PoolHandle::new(0, 1);
        assert!(PoolError::AlreadyReleased(handle).is_protocol_violation());
        assert!(PoolError::StaleHandle(handle).is_protocol_violation());
        assert!(PoolError::UnknownHandle(handle).is_protocol_violation());
        assert!(!PoolError::MissingFactory.is_protocol_violation());
        assert!(!PoolError::Factory("boom".into()).is_protocol_violation());
    }

    #[test]
    fn test_hook_error_keeps_source() {
        let err = PoolError::hook(HookStage::Release, "reset failed".into());
        assert_eq!(err.to_string(), "Release hook failed");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "reset failed");
    }
}
