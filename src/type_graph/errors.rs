use thiserror::Error;

use crate::object_graph::ObjectGraphError;
use crate::type_catalog::CatalogError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeGraphError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Object(#[from] ObjectGraphError),

    #[error("Class `{class}` has no accessor for property `{property}`")]
    UnresolvedAccessor { class: String, property: String },

    #[error("Type graph rooted at `{root}` has no node for `{class}`")]
    UnknownNode { root: String, class: String },

    #[error("Node `{0}` has not been assigned an alias")]
    Unnamed(String),
}
