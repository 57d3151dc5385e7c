//=========================================================================
// Engine Errors
//=========================================================================
//
// Error taxonomy for the engine core.
//
// Only fatal errors abort the scheduler. Contract violations are
// rejected at the call boundary and returned to the caller. Lookup
// failures and soft warnings never surface as `Err`: they are logged
// where they are detected and the call degrades to a no-op.
//
//   Fatal               → NoScene, UnregisteredScene, EventLoop*, Window*
//   Contract violation  → MissingEntity, NotRunning
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;
use winit::error::{EventLoopError, OsError};

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;

//=== Constants ===========================================================

/// Base of the numeric reason codes returned by [`EngineError::code`].
pub const ERROR_CODE_BASE: u32 = 6000;

//=== EngineError =========================================================

/// Errors surfaced by the engine API.
#[derive(Debug, Error)]
pub enum EngineError {
    //--- Fatal ------------------------------------------------------------
    /// `start()` was called without an active scene.
    #[error("no active scene at start")]
    NoScene,

    /// The initial scene key was never registered.
    #[error("scene {0} is not registered")]
    UnregisteredScene(String),

    #[error("failed to create event loop: {0}")]
    EventLoopCreation(#[source] EventLoopError),

    #[error("event loop failed: {0}")]
    EventLoopExecution(#[source] EventLoopError),

    #[error("failed to create window: {0}")]
    WindowCreation(#[source] OsError),

    //--- Contract violations ----------------------------------------------
    /// A physics body was requested for an entity the active scene does not own.
    #[error("entity {0:?} does not exist in the active scene")]
    MissingEntity(EntityId),

    /// A frame was requested outside the RUNNING state.
    #[error("engine is not running")]
    NotRunning,
}

impl EngineError {
    /// `true` for errors that terminate the scheduler.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoScene
                | Self::UnregisteredScene(_)
                | Self::EventLoopCreation(_)
                | Self::EventLoopExecution(_)
                | Self::WindowCreation(_)
        )
    }

    /// Numeric reason code, stable across releases.
    pub fn code(&self) -> u32 {
        let offset = match self {
            Self::NoScene => 0,
            Self::UnregisteredScene(_) => 1,
            Self::EventLoopCreation(_) => 2,
            Self::EventLoopExecution(_) => 3,
            Self::WindowCreation(_) => 4,
            Self::MissingEntity(_) => 5,
            Self::NotRunning => 6,
        };
        ERROR_CODE_BASE + offset
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(EngineError::NoScene.is_fatal());
        assert!(EngineError::UnregisteredScene("Menu".into()).is_fatal());
        assert!(!EngineError::MissingEntity(EntityId::from_raw(3)).is_fatal());
        assert!(!EngineError::NotRunning.is_fatal());
    }

    #[test]
    fn codes_are_offset_from_base() {
        assert_eq!(EngineError::NoScene.code(), 6000);
        assert_eq!(EngineError::NotRunning.code(), 6006);
    }

    #[test]
    fn display_messages() {
        assert_eq!(EngineError::NoScene.to_string(), "no active scene at start");
        assert_eq!(
            EngineError::UnregisteredScene("Title".into()).to_string(),
            "scene Title is not registered"
        );
    }

    #[test]
    fn is_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }
}
