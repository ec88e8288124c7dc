//! Error taxonomy for the render pipeline.
//!
//! Every fatal failure aborts the pipeline and surfaces as one [`RenderError`].
//! Sandbox cleanup failures never appear here; they are logged and dropped.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Input is not a well-formed YAML stream of mappings.
    #[error("decode input: {0}")]
    Decode(String),

    /// The control document matched by `apiVersion`/`kind` has an invalid shape.
    #[error("invalid {kind} document: {message}")]
    Schema { kind: &'static str, message: String },

    /// Duplicate control document or reserved filename collision.
    #[error("{0}")]
    Constraint(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The directive file cannot be merged.
    #[error("update {file}: {message}")]
    Merge { file: &'static str, message: String },

    #[error("{0}")]
    Build(String),

    /// Re-serializing documents failed.
    #[error("encode documents: {0}")]
    Encode(String),
}

/// Failures of the sandboxed materializer.
///
/// Path-shape rejections (`AbsolutePath`, `Traversal`) are reported before any
/// filesystem access, so they never leave traces in or outside the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("create sandbox directory: {0}")]
    Create(#[source] std::io::Error),

    #[error("absolute path {0:?} is not allowed in the sandbox")]
    AbsolutePath(String),

    #[error("path {0:?} does not resolve strictly inside the sandbox")]
    Traversal(String),

    #[error("file {0:?} not found in the sandbox")]
    NotFound(String),

    #[error("sandbox has already been destroyed")]
    Destroyed,

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}
