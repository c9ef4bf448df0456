//! Error taxonomy for the component runtime.
//!
//! None of these are fatal to the host document: every pipeline stage reports
//! the error and degrades to leaving the affected markup or value as it was.

use thiserror::Error;

/// Template acquisition failed; the element stays unrendered.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Template '{template}' could not be located from base '{base}': {reason}")]
    InvalidUrl {
        template: String,
        base: String,
        reason: String,
    },

    #[error("Template '{url}' responded with status {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Element is not connected to a base location")]
    NotConnected,
}

/// The fetcher could not produce any response.
#[derive(Error, Debug)]
#[error("Request for '{url}' failed: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

/// A conditional or interpolation expression could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unexpected token '{found}', expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Identifier '{name}' is not available; reference instance state through `this`")]
    UnknownIdentifier { name: String },

    #[error("Property '{name}' is not declared on this component")]
    UnknownProperty { name: String },

    #[error("Method '{name}' is not exposed by this component")]
    UnknownMethod { name: String },

    #[error("Cannot read '{member}' of null")]
    NullAccess { member: String },

    #[error("'{callee}' is not callable")]
    NotCallable { callee: String },

    #[error("Unterminated interpolation starting at offset {offset}")]
    UnterminatedInterpolation { offset: usize },

    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Expression has more than {limit} operations")]
    TooComplex { limit: usize },
}

/// An inbound attribute value could not be coerced to the property's kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Attribute '{attribute}' value '{value}' is not a number")]
    NotANumber { attribute: String, value: String },
}

/// A relative resource reference could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to resolve path '{path}' against '{base}': {reason}")]
pub struct PathError {
    pub path: String,
    pub base: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for callers that drive several stages at once.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
