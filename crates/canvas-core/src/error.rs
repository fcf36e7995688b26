// File: crates/canvas-core/src/error.rs
// Summary: Error taxonomy for engines, surface acquisition, and painting.

use thiserror::Error;

/// Failure raised by a graphics engine while building or driving a surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("hardware context limit exceeded")]
    ContextLimit,
    #[error("graphics context lost")]
    ContextLost,
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("engine load failed: {0}")]
    Load(String),
    #[error("{0}")]
    Backend(String),
}

/// Why a paint attempt failed. Always contained by the manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaintFailure {
    #[error("could not obtain canvas: {0}")]
    Canvas(EngineError),
    #[error("draw callback failed: {0}")]
    Callback(String),
    #[error("draw callback panicked: {0}")]
    Panicked(String),
    #[error("flush failed: {0}")]
    Flush(EngineError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// Engine handle not ready yet; the operation was skipped.
    #[error("graphics engine not ready")]
    NotReady,
    /// Neither hardware nor software construction produced a surface.
    /// `None` for a strategy means it returned no surface without raising.
    #[error("surface acquisition failed (hardware: {}, software: {})", describe(.hardware), describe(.software))]
    Acquisition {
        hardware: Option<EngineError>,
        software: Option<EngineError>,
    },
    #[error(transparent)]
    Paint(#[from] PaintFailure),
    /// Release of an already-invalid surface.
    #[error("stale surface handle: {0}")]
    StaleHandle(EngineError),
}

impl SurfaceError {
    pub fn is_not_ready(&self) -> bool { matches!(self, SurfaceError::NotReady) }
}

fn describe(e: &Option<EngineError>) -> String {
    match e {
        Some(e) => e.to_string(),
        None => "no surface".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_message_names_both_paths() {
        let e = SurfaceError::Acquisition { hardware: Some(EngineError::ContextLimit), software: None };
        assert_eq!(
            e.to_string(),
            "surface acquisition failed (hardware: hardware context limit exceeded, software: no surface)"
        );
    }
}
