use thiserror::Error;

use super::ObjectId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ObjectGraphError {
    #[error("Object {0} does not belong to this graph")]
    UnknownObject(ObjectId),
    #[error("Object {0} is not a class instance")]
    NotAnObject(ObjectId),
    #[error("Map key must be a scalar value (object {0})")]
    NonScalarMapKey(ObjectId),
    #[error("Fixture references undefined object `@{0}`")]
    UndefinedReference(String),
    #[error("Fixture value for `{field}` does not fit declared type `{declared}`: {value}")]
    ValueMismatch {
        field: String,
        declared: String,
        value: String,
    },
    #[error("Fixture object `{0}` must give exactly one of `class`, `array` or `collection`")]
    MalformedInstance(String),
    #[error("Class `{class}` has no accessor for property `{property}`")]
    UnresolvedAccessor { class: String, property: String },
    #[error("Failed to parse fixture: {0}")]
    Parse(String),
}
