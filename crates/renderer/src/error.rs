use std::fmt;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Reasons a shader program could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{stage} shader failed to compile: {message}")]
    Compile { stage: Stage, message: String },
    #[error("uniform `{name}` has unsupported type `{ty}`")]
    UnsupportedUniform { name: String, ty: String },
    #[error("program failed to link: {0}")]
    Link(String),
}

/// Failures surfaced by the lifecycle and its backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("graphics backend unavailable: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("failed to allocate GPU resource: {0}")]
    Resource(String),
    #[error("surface error: {0}")]
    Surface(String),
}
