//! Error types for Fabrica
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Boxed error produced by constructor bodies and factory strategies
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for Fabrica operations
pub type Result<T> = std::result::Result<T, FactoryError>;

/// A type name could not be resolved in any of the contexts tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNotFound {
    /// The fully-qualified name that was requested
    pub name: String,
    /// Names of the loading contexts consulted, in order
    pub tried: Vec<String>,
}

impl TypeNotFound {
    /// Failure for a single context
    pub fn new(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tried: vec![context.into()],
        }
    }

    /// Record another context that also failed to resolve the name
    pub fn also_tried(mut self, context: impl Into<String>) -> Self {
        self.tried.push(context.into());
        self
    }
}

impl fmt::Display for TypeNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type '{}' not found", self.name)?;
        if !self.tried.is_empty() {
            write!(f, " (tried: {})", self.tried.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeNotFound {}

/// Error types for the instantiation service
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The named type is not defined by any context tried
    #[error("Instantiation failed: {0}")]
    TypeNotFound(#[from] TypeNotFound),

    /// No matching constructor, an argument was rejected, or the body failed
    #[error("Instantiation failed for {type_name}: {source}")]
    ConstructionFailed {
        /// Type being constructed
        type_name: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// A configured strategy type does not implement `Factory`
    #[error("Incorrect factory {factory} for type {type_name}")]
    IncorrectFactory {
        /// Configured strategy type name
        factory: String,
        /// Type the strategy was requested for
        type_name: String,
    },

    /// Signature and argument lists differ in length
    #[error("Signature of {type_name} declares {expected} parameters but {actual} arguments were given")]
    SignatureMismatch {
        /// Type being constructed
        type_name: String,
        /// Number of signature entries
        expected: usize,
        /// Number of arguments
        actual: usize,
    },

    /// Empty type name
    #[error("Missing type name")]
    MissingTypeName,

    /// A configured loading context could not be built
    #[error("No such loading context '{loader}'")]
    InitializationFailed {
        /// Configured context-provider type name
        loader: String,
        /// Underlying cause
        #[source]
        source: Box<FactoryError>,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FactoryError {
    /// Construction failure with a plain message as cause
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        FactoryError::ConstructionFailed {
            type_name: type_name.into(),
            source: reason.into(),
        }
    }

    /// Construction failure wrapping an existing error
    pub fn construction_source(type_name: impl Into<String>, source: BoxError) -> Self {
        FactoryError::ConstructionFailed {
            type_name: type_name.into(),
            source,
        }
    }

    /// True if the failure is (or wraps) an unresolved type name
    pub fn is_type_not_found(&self) -> bool {
        match self {
            FactoryError::TypeNotFound(_) => true,
            FactoryError::InitializationFailed { source, .. } => source.is_type_not_found(),
            _ => false,
        }
    }
}
