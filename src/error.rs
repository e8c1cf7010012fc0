use thiserror::Error;

/// Failure of a single storage medium.
///
/// Never crosses the public store API: the tiered store recovers by falling
/// through to the next medium, and an exhausted chain reads as absent.
#[derive(Debug, Error)]
pub enum MediumError {
    #[error("medium `{medium}` unavailable: {reason}")]
    Unavailable {
        medium: &'static str,
        reason: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt payload under key `{key}`")]
    Corrupt { key: String },
}

impl MediumError {
    pub fn unavailable(medium: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            medium,
            reason: reason.into(),
        }
    }

    pub fn corrupt(key: impl Into<String>) -> Self {
        Self::Corrupt { key: key.into() }
    }
}

/// Failure of the external content-generation collaborator.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generator backend unavailable: {0}")]
    Unavailable(String),
    #[error("content generation failed for `{route}`: {reason}")]
    Failed { route: String, reason: String },
}

impl GenerateError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn failed(route: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            route: route.into(),
            reason: reason.into(),
        }
    }
}

/// The only error a resolution can surface: content could not be produced.
///
/// Adaptive routes convert a static-path generation failure into a dynamic
/// fallback, so this reaches callers only when every applicable path failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to generate content for `{route}`")]
    Generation {
        route: String,
        #[source]
        source: GenerateError,
    },
}

impl ResolveError {
    pub fn generation(route: impl Into<String>, source: GenerateError) -> Self {
        Self::Generation {
            route: route.into(),
            source,
        }
    }
}
