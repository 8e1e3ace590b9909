use thiserror::Error;

/// Request-shape failures. Raised before any statement reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Element {element} cannot be null")]
    Missing { element: &'static str },

    #[error("Invalid data type for element {element}")]
    InvalidType { element: &'static str },

    #[error("Element {element} must be greater than zero")]
    NotPositive { element: &'static str },

    #[error("Element {element} is out of range")]
    OutOfRange { element: &'static str },

    #[error("Invalid value type in filter")]
    InvalidFilterValueType,

    #[error("Invalid value in filter")]
    InvalidFilterValue,

    #[error("Invalid value type '{value_type}' in filter")]
    UnsupportedFilterValueType { value_type: String },
}
