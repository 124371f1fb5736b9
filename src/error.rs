//! Error types for object operations and configuration loading.

use thiserror::Error;

use crate::strategy::MergeStrategy;

/// Errors raised by object model operations and by the composer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// The dynamic language's `TypeError`.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// The object refuses own-property enumeration.
    #[error("TypeError: object refuses own-property introspection")]
    IntrospectionRefused,

    /// Two writers claimed the same property under a strict merge strategy.
    #[error("property '{key}' is already defined on the target")]
    Conflict { key: String },

    /// Flat composition attempted under `namespaced-only`.
    #[error("merge strategy '{strategy}' only allows namespaced composition")]
    NamespaceRequired { strategy: MergeStrategy },

    /// Lookup of a method or component that does not exist.
    #[error("'{0}' is not defined")]
    NotFound(String),

    /// A native function body reported a failure.
    #[error("native function failed: {0}")]
    Native(String),
}

impl ObjectError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ObjectError::TypeError(message.into())
    }
}

/// Errors raised while loading a [`ComposerConfig`](crate::config::ComposerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown merge strategy '{0}'")]
    UnknownStrategy(String),
}
