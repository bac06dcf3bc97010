use thiserror::Error;

/// Failures the engine recovers from by degrading rather than stopping.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("startup configuration unavailable: {0}")]
    Config(String),
    #[error("model '{path}' failed to load: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("transport error: {0}")]
    Transport(String),
}
