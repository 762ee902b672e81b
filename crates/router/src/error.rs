use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error type produced by route steps and module loaders
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("a route path is required")]
    MissingPath,

    #[error("a route handler is required for path \"{path}\"")]
    MissingHandler { path: String },

    #[error("invalid middleware for path \"{path}\": {reason}")]
    InvalidMiddleware { path: String, reason: String },

    #[error("invalid pattern: {reason} (while parsing \"{path}\" in \"{route}\")")]
    InvalidPattern { path: String, route: String, reason: String },

    #[error("unable to load module \"{module}\"{}", with_method(.export.as_deref()))]
    InvalidHandler { module: String, export: Option<String> },

    #[error("failed to load module \"{module}\": {source}")]
    LoaderFailure {
        module: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to decode path segment \"{value}\"")]
    Decode { value: String },

    #[error("router is not configured, call configure() before matching requests")]
    NotConfigured,

    #[error("unable to read routes file \"{}\": {source}", path.display())]
    RoutesFile {
        path: PathBuf,
        #[source]
        source: RoutesFileError,
    },
}

impl RouteError {
    pub fn missing_handler<S: ToString>(path: S) -> Self {
        Self::MissingHandler { path: path.to_string() }
    }

    pub fn invalid_middleware<P: ToString, S: ToString>(path: P, reason: S) -> Self {
        Self::InvalidMiddleware { path: path.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_handler<S: ToString>(module: S, export: Option<&str>) -> Self {
        Self::InvalidHandler { module: module.to_string(), export: export.map(ToString::to_string) }
    }

    pub fn loader_failure<S: ToString, E: Into<BoxError>>(module: S, source: E) -> Self {
        Self::LoaderFailure { module: module.to_string(), source: source.into() }
    }

    pub fn decode<S: ToString>(value: S) -> Self {
        Self::Decode { value: value.to_string() }
    }

    pub fn routes_file<P: Into<PathBuf>, E: Into<RoutesFileError>>(path: P, source: E) -> Self {
        Self::RoutesFile { path: path.into(), source: source.into() }
    }
}

fn with_method(export: Option<&str>) -> String {
    export.map(|e| format!(" with method \"{e}\"")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum RoutesFileError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("invalid json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid route at index {index}: {reason}")]
    InvalidRoute { index: usize, reason: String },
}

impl RoutesFileError {
    pub fn invalid_route<S: ToString>(index: usize, reason: S) -> Self {
        Self::InvalidRoute { index, reason: reason.to_string() }
    }
}

/// Error returned when running a matched route
#[derive(Debug, Error)]
pub enum InvokeError {
    /// the route handler could not be resolved, the same error is returned on every call
    #[error("route handler unavailable: {0}")]
    Unresolved(Arc<RouteError>),

    /// a step of the chain failed, the host decides how to render it
    #[error("route step failed: {0}")]
    Step(BoxError),

    /// the route could not be looked up
    #[error("route lookup failed: {0}")]
    Match(RouteError),
}

impl InvokeError {
    /// Returns the cached resolution error, if this is one
    pub fn as_unresolved(&self) -> Option<&Arc<RouteError>> {
        match self {
            InvokeError::Unresolved(e) => Some(e),
            InvokeError::Step(_) | InvokeError::Match(_) => None,
        }
    }
}
