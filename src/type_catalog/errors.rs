use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("No class descriptor registered for `{class}`")]
    UnknownClass { class: String },
    #[error("Class `{class}` is registered twice")]
    DuplicateClass { class: String },
    #[error("Class `{class}` extends unknown class `{superclass}`")]
    UnknownSuperclass { class: String, superclass: String },
    #[error("Class `{class}` extends `{superclass}`, which is an interface")]
    SuperclassIsInterface { class: String, superclass: String },
    #[error("Class `{class}` lists `{interface}` as an interface, but it is not one")]
    NotAnInterface { class: String, interface: String },
    #[error("Interface `{class}` cannot declare a superclass")]
    InterfaceWithSuperclass { class: String },
    #[error("Inheritance cycle detected through `{class}`")]
    InheritanceCycle { class: String },
    #[error("Property `{class}.{property}` is declared twice")]
    DuplicateProperty { class: String, property: String },
    #[error("Property `{class}.{property}` refers to unknown class `{target}`")]
    UnknownPropertyType {
        class: String,
        property: String,
        target: String,
    },
    #[error("Invalid type expression `{0}`")]
    InvalidType(String),
    #[error("Failed to read catalog file: {error}")]
    ReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ParseError { error: String },
}

/// Raised when an existing table cannot be reconciled with a descriptor
/// without guessing the caller's intent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    #[error(
        "Ambiguous schema change on table `{table}`: dropped {dropped:?}, added {added:?}. \
         Rename and type change cannot be told apart"
    )]
    AmbiguousSchemaChange {
        table: String,
        dropped: Vec<String>,
        added: Vec<String>,
    },
}
