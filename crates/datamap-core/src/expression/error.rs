//! Error types for expression compilation and evaluation
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while compiling or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Empty or whitespace-only source
    #[error("Expression is empty")]
    Empty,

    /// Tokenizer or parser rejected the source
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        message: String,
        position: usize,
        found: String,
    },

    /// Source ended before the expression was complete
    #[error("Unexpected end of expression: {message}")]
    UnexpectedEnd { message: String },

    /// Identifier not bound in the environment
    #[error("Unknown identifier: {name}")]
    UnknownIdentifier { name: String },

    /// Call to a helper that does not exist
    #[error("Unknown function: {name}()")]
    UnknownFunction { name: String },

    /// Helper called with the wrong number of arguments
    #[error("Function {function}() expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    /// Operand or argument of the wrong type
    #[error("Type mismatch in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    /// Argument of the right type but unusable value
    #[error("Invalid argument to {function}(): {message}")]
    InvalidArgument { function: String, message: String },

    /// Call target is not a plain function name
    #[error("Expression is not callable: {callee}")]
    NotCallable { callee: String },
}

impl ExpressionError {
    /// Create a syntax error at a byte offset
    pub fn syntax(message: impl Into<String>, position: usize, found: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            found: found.into(),
        }
    }

    /// Create an end-of-input error
    pub fn unexpected_end(message: impl Into<String>) -> Self {
        Self::UnexpectedEnd {
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an arity error
    pub fn arity(function: impl Into<String>, expected: impl Into<String>, found: usize) -> Self {
        Self::Arity {
            function: function.into(),
            expected: expected.into(),
            found,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised before evaluation started
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::Syntax { .. } | Self::UnexpectedEnd { .. }
        )
    }
}

impl From<ExpressionError> for crate::Error {
    fn from(err: ExpressionError) -> Self {
        crate::Error::Expression {
            message: err.to_string(),
            expression: None,
        }
    }
}
