//! SQL dialect adapters.
//!
//! The mapping core never hard-codes naming rules, reserved words or cast
//! syntax. Everything that differs between databases goes through the
//! [`Dialect`] trait so that the alias allocator, the type graph and the
//! query builder stay database-agnostic.

mod reserved;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_catalog::ScalarKind;

pub use reserved::{ANSI_RESERVED, SQLITE_RESERVED};

/// Columns of the array-membership table (one row per array or collection slot).
pub mod array_columns {
    /// Id of the array/collection object owning the slot
    pub const ARRAY_ID: &str = "ARRAY_ID";
    /// Zero-based slot index
    pub const SLOT: &str = "SLOT";
    /// Scalar element value
    pub const PRIM_VALUE: &str = "PRIM_VALUE";
    /// Id of a complex element
    pub const REF_ID: &str = "REF_ID";
    /// Key column for map entries
    pub const MAP_KEY: &str = "MAP_KEY";
}

/// Database-specific naming and syntax rules consumed by the mapping core.
pub trait Dialect: fmt::Debug {
    /// Short dialect identifier (used in logs and config)
    fn name(&self) -> &'static str;

    /// Whether `word` may not be used as an identifier (case-insensitive)
    fn is_reserved(&self, word: &str) -> bool;

    /// Primary-key column shared by every class table
    fn id_column(&self) -> &'static str {
        "DBID"
    }

    /// Table holding one row per array/collection slot
    fn array_table(&self) -> &'static str {
        "ARRAY_MEMBER"
    }

    /// Default table name for a class without an explicit mapping
    fn table_name(&self, class_name: &str) -> String {
        let simple = class_name.rsplit(['.', ':']).next().unwrap_or(class_name);
        let mut name = sanitize_identifier(simple);
        if self.is_reserved(&name) {
            name.push_str("_T");
        }
        name
    }

    /// Default column name for a property without an explicit mapping
    fn column_name(&self, property: &str) -> String {
        let mut name = sanitize_identifier(property);
        if self.is_reserved(&name) || name == self.id_column() {
            name.push_str("_C");
        }
        name
    }

    /// Numeric cast of `expr` to the given scalar kind
    fn cast_numeric(&self, expr: &str, target: ScalarKind) -> String;

    /// Column type used for a scalar property
    fn column_type(&self, kind: ScalarKind) -> &'static str;

    /// Column type of id and reference columns
    fn reference_type(&self) -> &'static str {
        "BIGINT"
    }

    /// Trailing LIMIT/OFFSET clause, `None` when neither is set
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {}", l)),
            (Some(l), Some(o)) => Some(format!("LIMIT {} OFFSET {}", l, o)),
            (None, Some(o)) => Some(format!("OFFSET {} ROWS", o)),
        }
    }
}

/// Uppercase, replace anything that is not `[A-Z0-9_]` and avoid a leading digit.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    for (i, ch) in raw.chars().enumerate() {
        if i == 0 && ch.is_ascii_digit() {
            out.push('_');
        }
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Plain ANSI SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn is_reserved(&self, word: &str) -> bool {
        ANSI_RESERVED.contains(word.to_ascii_uppercase().as_str())
    }

    fn cast_numeric(&self, expr: &str, target: ScalarKind) -> String {
        let sql_type = match target {
            ScalarKind::Int => "INTEGER",
            ScalarKind::Long => "BIGINT",
            ScalarKind::Float => "REAL",
            ScalarKind::Double => "DOUBLE PRECISION",
            _ => return expr.to_string(),
        };
        format!("CAST({} AS {})", expr, sql_type)
    }

    fn column_type(&self, kind: ScalarKind) -> &'static str {
        match kind {
            ScalarKind::Bool => "BOOLEAN",
            ScalarKind::Int => "INTEGER",
            ScalarKind::Long => "BIGINT",
            ScalarKind::Float => "REAL",
            ScalarKind::Double => "DOUBLE PRECISION",
            ScalarKind::Text => "VARCHAR(4000)",
            ScalarKind::Bytes => "BLOB",
        }
    }
}

/// SQLite: integers are 64-bit and floats are doubles, LIMIT is mandatory before OFFSET.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        SQLITE_RESERVED.contains(upper.as_str()) || ANSI_RESERVED.contains(upper.as_str())
    }

    fn cast_numeric(&self, expr: &str, target: ScalarKind) -> String {
        match target {
            ScalarKind::Int | ScalarKind::Long => format!("CAST({} AS INTEGER)", expr),
            ScalarKind::Float | ScalarKind::Double => format!("CAST({} AS REAL)", expr),
            _ => expr.to_string(),
        }
    }

    fn column_type(&self, kind: ScalarKind) -> &'static str {
        match kind {
            ScalarKind::Bool | ScalarKind::Int | ScalarKind::Long => "INTEGER",
            ScalarKind::Float | ScalarKind::Double => "REAL",
            ScalarKind::Text => "TEXT",
            ScalarKind::Bytes => "BLOB",
        }
    }

    fn reference_type(&self) -> &'static str {
        "INTEGER"
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {}", l)),
            (Some(l), Some(o)) => Some(format!("LIMIT {} OFFSET {}", l, o)),
            (None, Some(o)) => Some(format!("LIMIT -1 OFFSET {}", o)),
        }
    }
}

/// Dialect selector used by configuration and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Ansi,
    Sqlite,
}

impl DialectKind {
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Ansi => Box::new(AnsiDialect),
            DialectKind::Sqlite => Box::new(SqliteDialect),
        }
    }
}

impl std::str::FromStr for DialectKind {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ansi" => Ok(DialectKind::Ansi),
            "sqlite" => Ok(DialectKind::Sqlite),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Ansi => write!(f, "ansi"),
            DialectKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown SQL dialect `{0}` (expected `ansi` or `sqlite`)")]
pub struct UnknownDialect(pub String);
