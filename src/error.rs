//! modsieve error types

use tracing::error;

/// modsieve error types
#[derive(Debug, thiserror::Error)]
pub enum ModsieveError {
    // Configuration document errors
    #[error("invalid config at {path}: {message}{}", allowed_hint(.allowed))]
    SchemaInvalid {
        path: String,
        message: String,
        allowed: Vec<String>,
    },

    /// Two definitions share a (case-insensitive) name but differ in body.
    #[error("{kind} name '{name}' is defined more than once with different definitions")]
    DuplicateName { kind: &'static str, name: String },

    #[error("no {kind} named '{name}' is defined in this config")]
    UnresolvedReference { kind: &'static str, name: String },

    #[error("invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    // Resource lookups
    /// Wiki or URL content could not be retrieved.
    #[error("{message}")]
    ContentFetch {
        reference: String,
        status: Option<u16>,
        message: String,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("not found: {0}")]
    NotFound(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// An error that has already been reported through tracing.
    ///
    /// Wrapping prevents the same failure from being logged again at every
    /// level it is re-raised through.
    #[error("{0}")]
    Logged(Box<ModsieveError>),
}

fn allowed_hint(allowed: &[String]) -> String {
    if allowed.is_empty() {
        String::new()
    } else {
        format!(" (allowed: {})", allowed.join(", "))
    }
}

impl ModsieveError {
    /// Build a schema error for the given JSON path.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModsieveError::SchemaInvalid {
            path: path.into(),
            message: message.into(),
            allowed: Vec::new(),
        }
    }

    /// Whether this error was already reported via [`log_once`](Self::log_once).
    pub fn is_logged(&self) -> bool {
        matches!(self, ModsieveError::Logged(_))
    }

    /// Log the error at its first occurrence and tag it as logged.
    ///
    /// Calling this on an already tagged error is a no-op, so every layer
    /// can call it on the way up without producing duplicate log lines.
    pub fn log_once(self, context: &str) -> Self {
        if self.is_logged() {
            return self;
        }
        error!(context, error = %self, "unexpected error");
        ModsieveError::Logged(Box::new(self))
    }

    /// The underlying error, looking through the logged tag.
    pub fn inner(&self) -> &ModsieveError {
        match self {
            ModsieveError::Logged(inner) => inner.inner(),
            other => other,
        }
    }

    /// HTTP-ish status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self.inner() {
            ModsieveError::Api { status, .. } => Some(*status),
            ModsieveError::NotFound(_) => Some(404),
            ModsieveError::ContentFetch { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ModsieveError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ModsieveError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => ModsieveError::Http(err.to_string()),
        }
    }
}

/// Result type alias for modsieve operations
pub type Result<T> = std::result::Result<T, ModsieveError>;
