use std::collections::BTreeSet;

use serde::Serialize;

use super::errors::TypeGraphError;
use crate::object_graph::Value;
use crate::type_catalog::DeclaredType;

/// One property column on a node's table.
///
/// `value` is `None` for class-only graphs (a placeholder) and the captured
/// value, possibly `Value::Null`, for graphs built around an instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySlot {
    pub name: String,
    pub column: String,
    pub declared: DeclaredType,
    pub value: Option<Value>,
    pub nullable: bool,
}

impl PropertySlot {
    pub fn is_set(&self) -> bool {
        matches!(&self.value, Some(v) if !v.is_null())
    }

    pub fn set_value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }
}

/// A table in the table-per-class mapping of one class or interface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeNode {
    pub class_name: String,
    pub table: String,
    pub alias: Option<String>,
    pub properties: Vec<PropertySlot>,
    /// Join this table even when none of its properties is set
    pub force_include: bool,
    pub is_array: bool,
    pub is_universal_root: bool,
    pub index_names: BTreeSet<String>,
}

impl TypeNode {
    pub(crate) fn new(class_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            table: table.into(),
            alias: None,
            properties: Vec::new(),
            force_include: false,
            is_array: false,
            is_universal_root: false,
            index_names: BTreeSet::new(),
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.properties.iter().filter(|p| p.is_set()).count()
    }

    pub fn has_values(&self) -> bool {
        self.non_null_count() > 0
    }

    /// Whether a query must join this node's table
    pub fn belongs_in_join(&self) -> bool {
        self.force_include || self.has_values()
    }

    pub fn alias(&self) -> Result<&str, TypeGraphError> {
        self.alias
            .as_deref()
            .ok_or_else(|| TypeGraphError::Unnamed(self.class_name.clone()))
    }

    pub fn property(&self, name: &str) -> Option<&PropertySlot> {
        self.properties.iter().find(|p| p.name == name)
    }
}
