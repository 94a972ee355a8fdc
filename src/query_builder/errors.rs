use thiserror::Error;

use crate::object_graph::ObjectGraphError;
use crate::type_catalog::CatalogError;
use crate::type_graph::TypeGraphError;

/// Caller mistakes. Generation stops at the first one; nothing is retried
/// or partially honoured.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UsageError {
    #[error("Limit set twice in one query (first {first}, then {second})")]
    DuplicateLimit { first: u64, second: u64 },

    #[error("Offset set twice in one query (first {first}, then {second})")]
    DuplicateOffset { first: u64, second: u64 },

    #[error("Example of type `{example}` cannot select objects of class `{class}`")]
    ExampleNotAssignable { example: String, class: String },

    #[error("Property `{property}` is declared as `{declared}` but holds a `{actual}`")]
    TypeMismatch {
        property: String,
        declared: String,
        actual: String,
    },

    #[error("Example graph nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("No property `{property}` on `{class}`")]
    UnknownProperty { class: String, property: String },

    #[error("{function} needs a numeric property, `{property}` is `{declared}`")]
    NonNumericAggregate {
        function: String,
        property: String,
        declared: String,
    },

    #[error("{function} needs a scalar property, `{property}` is `{declared}`")]
    NonScalarAggregate {
        function: String,
        property: String,
        declared: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryBuildError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    TypeGraph(#[from] TypeGraphError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Object(#[from] ObjectGraphError),
}

impl QueryBuildError {
    /// Usage errors, unresolved accessors and unknown classes included
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            QueryBuildError::Usage(_)
                | QueryBuildError::Catalog(CatalogError::UnknownClass { .. })
                | QueryBuildError::TypeGraph(TypeGraphError::Catalog(CatalogError::UnknownClass { .. }))
                | QueryBuildError::TypeGraph(TypeGraphError::UnresolvedAccessor { .. })
                | QueryBuildError::Object(ObjectGraphError::UnresolvedAccessor { .. })
        )
    }
}

/// Problems turning a YAML query document into clauses
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DocumentError {
    #[error("Failed to parse query document: {0}")]
    Parse(String),

    #[error("Clause #{index} must set exactly one of selector/and/or/group/sort/order")]
    MalformedClause { index: usize },

    #[error(transparent)]
    Object(#[from] ObjectGraphError),
}
