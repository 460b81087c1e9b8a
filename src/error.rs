//! Error types for the nightly simulation harness
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Error context and chaining

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    Serialization = 204,

    // Backend connection errors (3xx)
    ConnectionFailed = 300,
    ConnectionTimeout = 301,

    // Backend protocol errors (4xx)
    BackendStatus = 400,
    BackendMalformed = 401,
    InvalidEndpoint = 402,

    // Execution errors (5xx)
    ExecutionFailed = 500,

    // Registry lookups (6xx)
    PersonaNotFound = 600,
    PersonaInvalid = 601,
    UnknownTier = 610,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────

    /// Could not reach the chat backend
    #[error("Failed to connect to {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// Chat backend did not answer in time
    #[error("Request to {url} timed out after {timeout_secs}s")]
    ConnectionTimeout { url: String, timeout_secs: u64 },

    /// Chat backend answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    BackendStatus { status: u16, body: String },

    /// Chat backend answered with a body we could not decode
    #[error("Malformed backend response: {message}")]
    BackendMalformed { message: String },

    /// Tier endpoint is not a usable http(s) URL
    #[error("Invalid endpoint '{endpoint}' for tier {tier}: {reason}")]
    InvalidEndpoint {
        tier: String,
        endpoint: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────

    /// Trial could not run
    #[error("Execution failed: {0}")]
    Execution(String),

    // ─────────────────────────────────────────────────────────────
    // Registry Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona id is not in the registry
    #[error("Persona not found: {id}")]
    PersonaNotFound { id: String },

    /// Persona definition failed validation
    #[error("Invalid persona definition {source_name}: {message}")]
    PersonaInvalid { source_name: String, message: String },

    /// Tier code is not in the tier registry
    #[error("Unknown model tier: {code}")]
    UnknownTier { code: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Json(_) => ErrorCode::Serialization,

            Error::ConnectionFailed { .. } => ErrorCode::ConnectionFailed,
            Error::ConnectionTimeout { .. } => ErrorCode::ConnectionTimeout,
            Error::BackendStatus { .. } => ErrorCode::BackendStatus,
            Error::BackendMalformed { .. } => ErrorCode::BackendMalformed,
            Error::InvalidEndpoint { .. } => ErrorCode::InvalidEndpoint,

            Error::Execution(_) => ErrorCode::ExecutionFailed,

            Error::PersonaNotFound { .. } => ErrorCode::PersonaNotFound,
            Error::PersonaInvalid { .. } => ErrorCode::PersonaInvalid,
            Error::UnknownTier { .. } => ErrorCode::UnknownTier,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the error came from talking to the chat backend
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed { .. }
                | Error::ConnectionTimeout { .. }
                | Error::BackendStatus { .. }
                | Error::BackendMalformed { .. }
        )
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Check the --config path, or omit it to use the built-in defaults."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. All sections are optional."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::ConnectionFailed { .. } => Some(
                "Is the inference server running? Check the tier endpoint or NIGHTLY_SIM_ENDPOINT."
            ),
            Error::ConnectionTimeout { .. } => Some(
                "The model may still be loading. Raise [backend] timeout_secs if this persists."
            ),
            Error::PersonaInvalid { .. } => Some(
                "Every persona needs a non-empty id, display_name and system_prompt."
            ),
            Error::UnknownTier { .. } => Some(
                "Use one of the tier codes defined in the tier table (see [[tiers]] in the config)."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mFatal error [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConnectionFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a persona validation error
    pub fn persona_invalid(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PersonaInvalid {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
