//! Error types for plugit.

use thiserror::Error;

/// Result type alias for plugit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed ids, declarations or dependencies.
    Configuration,
    /// A phase or handshake invoked out of order.
    Protocol,
    /// Unknown plugin id during lookup.
    Lookup,
    /// An abstract plugin hook was not overridden.
    NotImplemented,
    /// Failure raised by plugin code.
    Plugin,
    /// Configuration (de)serialization failure.
    Serialization,
}

/// Errors that can occur while composing and bootstrapping plugins.
#[derive(Error, Debug)]
pub enum Error {
    // Registration errors
    #[error("plugin has no id")]
    MissingId,

    #[error("plugin id '{0}' is reserved")]
    ReservedId(String),

    #[error("duplicated plugin id: {0}")]
    DuplicateId(String),

    // Declaration errors
    #[error("invalid argument in plugin '{plugin}': {reason}")]
    InvalidArgument { plugin: String, reason: String },

    #[error("plugin '{plugin}' has no extension point '{extension_point}'")]
    UnknownExtensionPoint {
        plugin: String,
        extension_point: String,
    },

    #[error(
        "plugin '{plugin}' cannot attach to '{target}.{extension_point}': no connection declared"
    )]
    UndeclaredConnection {
        plugin: String,
        target: String,
        extension_point: String,
    },

    #[error("contract mismatch on '{target}.{extension_point}': {reason}")]
    ContractMismatch {
        target: String,
        extension_point: String,
        reason: String,
    },

    // Composition errors
    #[error("plugin '{plugin}' depends on unregistered plugin '{dependency}'")]
    UnresolvedDependency { plugin: String, dependency: String },

    #[error("plugin '{plugin}' declares a connection to unknown plugin '{target}'")]
    UnknownTargetPlugin { plugin: String, target: String },

    #[error("plugin '{plugin}' declares a connection to the wildcard id")]
    WildcardTarget { plugin: String },

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    // Event errors
    #[error("event '{event}' is not defined on '{owner}'")]
    InvalidEvent { owner: String, event: String },

    // Phase errors
    #[error("plugins have already been compiled")]
    AlreadyCompiled,

    #[error("plugins have already been started")]
    AlreadyStarted,

    #[error("extensions have already been plugged")]
    AlreadyExtended,

    #[error("cannot {operation} during phase {phase}")]
    PhaseOutOfOrder {
        operation: &'static str,
        phase: String,
    },

    #[error("reset is only permitted in debug mode")]
    ResetNotPermitted,

    // Plugin errors
    #[error("{hook}() is not implemented by plugin '{plugin}'")]
    NotImplemented { plugin: String, hook: &'static str },

    #[error("plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingId
            | Error::ReservedId(_)
            | Error::DuplicateId(_)
            | Error::InvalidArgument { .. }
            | Error::UnknownExtensionPoint { .. }
            | Error::ContractMismatch { .. }
            | Error::UnresolvedDependency { .. }
            | Error::UnknownTargetPlugin { .. }
            | Error::WildcardTarget { .. } => ErrorKind::Configuration,
            Error::InvalidEvent { .. }
            | Error::UndeclaredConnection { .. }
            | Error::AlreadyCompiled
            | Error::AlreadyStarted
            | Error::AlreadyExtended
            | Error::PhaseOutOfOrder { .. }
            | Error::ResetNotPermitted => ErrorKind::Protocol,
            Error::PluginNotFound(_) => ErrorKind::Lookup,
            Error::NotImplemented { .. } => ErrorKind::NotImplemented,
            Error::Plugin { .. } => ErrorKind::Plugin,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Only lookup failures are meant to be swallowed by callers.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Lookup
    }

    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid_argument(plugin: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            plugin: plugin.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a failure raised from plugin code.
    pub fn plugin(plugin: &str, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
