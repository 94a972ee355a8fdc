//! Reconciling a class descriptor with the columns of an existing table.
//!
//! The comparison is deliberately conservative: a dropped column paired with
//! an added column of the same type is a rename, anything less clear-cut is
//! reported as [`MetadataError::AmbiguousSchemaChange`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, MetadataError};
use super::{DeclaredType, TypeCatalog};
use crate::dialect::Dialect;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaChange {
    AddColumn(ColumnSpec),
    DropColumn(String),
    RenameColumn { from: String, to: String },
    ChangeType { column: String, from: String, to: String },
}

/// Columns the class's own table should have: id column first, then one per own property
pub fn wanted_columns(
    catalog: &TypeCatalog,
    class: &str,
    dialect: &dyn Dialect,
) -> Result<Vec<ColumnSpec>, CatalogError> {
    let descriptor = catalog.require(class)?;
    let mut columns = vec![ColumnSpec::new(dialect.id_column(), dialect.reference_type())];
    for prop in &descriptor.properties {
        let name = prop
            .column
            .clone()
            .unwrap_or_else(|| dialect.column_name(&prop.name));
        let sql_type = match &prop.declared {
            DeclaredType::Scalar(kind) => dialect.column_type(*kind),
            _ => dialect.reference_type(),
        };
        columns.push(ColumnSpec::new(name, sql_type));
    }
    Ok(columns)
}

/// Compute the changes turning `existing` into `wanted` for one table
pub fn diff_columns(
    table: &str,
    existing: &[ColumnSpec],
    wanted: &[ColumnSpec],
) -> Result<Vec<SchemaChange>, MetadataError> {
    let existing_by_name: HashMap<&str, &ColumnSpec> =
        existing.iter().map(|c| (c.name.as_str(), c)).collect();
    let wanted_by_name: HashMap<&str, &ColumnSpec> =
        wanted.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changes = Vec::new();
    for col in wanted {
        if let Some(old) = existing_by_name.get(col.name.as_str()) {
            if !old.sql_type.eq_ignore_ascii_case(&col.sql_type) {
                changes.push(SchemaChange::ChangeType {
                    column: col.name.clone(),
                    from: old.sql_type.clone(),
                    to: col.sql_type.clone(),
                });
            }
        }
    }

    let dropped: Vec<&ColumnSpec> = existing
        .iter()
        .filter(|c| !wanted_by_name.contains_key(c.name.as_str()))
        .collect();
    let added: Vec<&ColumnSpec> = wanted
        .iter()
        .filter(|c| !existing_by_name.contains_key(c.name.as_str()))
        .collect();

    if dropped.is_empty() {
        changes.extend(added.into_iter().cloned().map(SchemaChange::AddColumn));
        return Ok(changes);
    }
    if added.is_empty() {
        changes.extend(dropped.into_iter().map(|c| SchemaChange::DropColumn(c.name.clone())));
        return Ok(changes);
    }

    // Both sides changed: every dropped column must pair with exactly one
    // added column of the same type, and vice versa.
    let ambiguous = || MetadataError::AmbiguousSchemaChange {
        table: table.to_string(),
        dropped: dropped.iter().map(|c| c.name.clone()).collect(),
        added: added.iter().map(|c| c.name.clone()).collect(),
    };
    if dropped.len() != added.len() {
        return Err(ambiguous());
    }
    for old in &dropped {
        let candidates: Vec<&&ColumnSpec> = added
            .iter()
            .filter(|c| c.sql_type.eq_ignore_ascii_case(&old.sql_type))
            .collect();
        let reverse = dropped
            .iter()
            .filter(|c| c.sql_type.eq_ignore_ascii_case(&old.sql_type))
            .count();
        if candidates.len() != 1 || reverse != 1 {
            return Err(ambiguous());
        }
        changes.push(SchemaChange::RenameColumn {
            from: old.name.clone(),
            to: candidates[0].name.clone(),
        });
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::type_catalog::ClassDescriptor;

    fn col(name: &str, ty: &str) -> ColumnSpec {
        ColumnSpec::new(name, ty)
    }

    #[test]
    fn test_pure_addition() {
        let changes = diff_columns(
            "PERSON",
            &[col("DBID", "BIGINT")],
            &[col("DBID", "BIGINT"), col("NAME", "VARCHAR(4000)")],
        )
        .unwrap();
        assert_eq!(changes, vec![SchemaChange::AddColumn(col("NAME", "VARCHAR(4000)"))]);
    }

    #[test]
    fn test_rename_with_same_type() {
        let changes = diff_columns(
            "PERSON",
            &[col("DBID", "BIGINT"), col("NAME", "TEXT")],
            &[col("DBID", "BIGINT"), col("FULL_NAME", "text")],
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![SchemaChange::RenameColumn {
                from: "NAME".into(),
                to: "FULL_NAME".into()
            }]
        );
    }

    #[test]
    fn test_rename_plus_type_change_is_ambiguous() {
        let err = diff_columns(
            "PERSON",
            &[col("DBID", "BIGINT"), col("AGE", "INTEGER")],
            &[col("DBID", "BIGINT"), col("YEARS", "TEXT")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            MetadataError::AmbiguousSchemaChange {
                table: "PERSON".into(),
                dropped: vec!["AGE".into()],
                added: vec!["YEARS".into()],
            }
        );
    }

    #[test]
    fn test_two_renames_of_same_type_are_ambiguous() {
        let result = diff_columns(
            "T",
            &[col("A", "INTEGER"), col("B", "INTEGER")],
            &[col("C", "INTEGER"), col("D", "INTEGER")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_type_change_in_place() {
        let changes = diff_columns("T", &[col("A", "INTEGER")], &[col("A", "BIGINT")]).unwrap();
        assert_eq!(
            changes,
            vec![SchemaChange::ChangeType {
                column: "A".into(),
                from: "INTEGER".into(),
                to: "BIGINT".into()
            }]
        );
    }

    #[test]
    fn test_wanted_columns_from_descriptor() {
        let catalog = TypeCatalog::from_descriptors([
            ClassDescriptor::class("Address").property("city", DeclaredType::text()),
            ClassDescriptor::class("Person")
                .property("age", DeclaredType::int())
                .property("home", DeclaredType::class("Address")),
        ])
        .unwrap();
        let columns = wanted_columns(&catalog, "Person", &AnsiDialect).unwrap();
        assert_eq!(
            columns,
            vec![
                col("DBID", "BIGINT"),
                col("AGE", "INTEGER"),
                col("HOME", "BIGINT"),
            ]
        );
    }
}
