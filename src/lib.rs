//! objmap - object graph to relational mapping
//!
//! This crate maps object graphs described by a type catalog onto
//! table-per-class relational storage:
//! - Type catalogs and per-class/per-instance type graphs
//! - Query-by-example SQL generation with AND/OR grouping and ordering
//! - Alias allocation across query positions
//! - Safe-delete checks over a persisted reference-edge table

pub mod alias;
pub mod config;
pub mod dialect;
pub mod object_graph;
pub mod protection;
pub mod query_builder;
pub mod type_catalog;
pub mod type_graph;

use thiserror::Error;

pub use dialect::{AnsiDialect, Dialect, DialectKind, SqliteDialect};
pub use object_graph::{ObjectGraph, ObjectId, Value};
pub use query_builder::{Clause, QueryBuilder, Selector, StatementPrototype};
pub use type_catalog::TypeCatalog;

/// Any error the library can return
#[derive(Debug, Error)]
pub enum ObjmapError {
    #[error(transparent)]
    Catalog(#[from] type_catalog::CatalogError),

    #[error(transparent)]
    Metadata(#[from] type_catalog::MetadataError),

    #[error(transparent)]
    Object(#[from] object_graph::ObjectGraphError),

    #[error(transparent)]
    TypeGraph(#[from] type_graph::TypeGraphError),

    #[error(transparent)]
    Query(#[from] query_builder::QueryBuildError),

    #[error(transparent)]
    Document(#[from] query_builder::DocumentError),

    #[error(transparent)]
    Protection(#[from] protection::ProtectionError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
