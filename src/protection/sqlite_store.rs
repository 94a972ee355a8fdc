//! Edge table on SQLite through a borrowed `rusqlite` connection.
//!
//! The store borrows a [`Connection`]; a [`rusqlite::Transaction`] derefs to
//! one, so checks and writes run inside whatever transaction the caller
//! opened.

use rusqlite::{params, Connection, Row};

use super::edge_store::{Edge, EdgeStore, ProtectionEntry};
use super::errors::ProtectionError;
use crate::dialect::sanitize_identifier;

/// Default edge table name
pub const EDGE_TABLE: &str = "HAS_A";

const COLUMNS: &str = "OWNER_TABLE, OWNER_ID, PROPERTY_TABLE, PROPERTY_ID, PROPERTY_CLASS, RELATION_NAME";

pub struct SqliteEdgeStore<'c> {
    conn: &'c Connection,
    table: String,
}

impl<'c> SqliteEdgeStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            table: EDGE_TABLE.to_string(),
        }
    }

    /// Use a different edge table. The name must already be a plain identifier.
    pub fn with_table(conn: &'c Connection, table: &str) -> Result<Self, ProtectionError> {
        if table.is_empty() || sanitize_identifier(table) != table {
            return Err(ProtectionError::InvalidTableName(table.to_string()));
        }
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the edge table and its lookup indexes if missing
    pub fn create_table(&self) -> Result<(), ProtectionError> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                OWNER_TABLE TEXT NULL,
                OWNER_ID INTEGER NULL,
                PROPERTY_TABLE TEXT NOT NULL,
                PROPERTY_ID INTEGER NOT NULL,
                PROPERTY_CLASS TEXT NULL,
                RELATION_NAME TEXT NULL
            );
            CREATE INDEX IF NOT EXISTS {t}_OWNER ON {t} (OWNER_TABLE, OWNER_ID);
            CREATE INDEX IF NOT EXISTS {t}_PROPERTY ON {t} (PROPERTY_TABLE, PROPERTY_ID);
            "#,
            t = self.table
        ))?;
        log::debug!("edge table {} ready", self.table);
        Ok(())
    }

    fn select(
        &self,
        filter: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<Edge>, ProtectionError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM {} WHERE {} ORDER BY ROWID",
            COLUMNS, self.table, filter
        ))?;
        let rows = stmt.query_map(args, read_row)?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row??);
        }
        Ok(edges)
    }
}

/// Outer result: driver errors. Inner: half-filled owner columns.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Result<Edge, ProtectionError>> {
    let owner_table: Option<String> = row.get(0)?;
    let owner_id: Option<i64> = row.get(1)?;
    let property = ProtectionEntry::new(row.get::<_, String>(2)?, row.get(3)?);
    let owner = match (owner_table, owner_id) {
        (Some(table), Some(id)) => Some(ProtectionEntry::new(table, id)),
        (None, None) => None,
        _ => {
            return Ok(Err(ProtectionError::HalfOwnedEdge {
                table: property.table,
                id: property.id,
            }))
        }
    };
    Ok(Ok(Edge {
        owner,
        property,
        property_class: row.get(4)?,
        relation: row.get(5)?,
    }))
}

impl EdgeStore for SqliteEdgeStore<'_> {
    fn outgoing(&self, owner: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError> {
        self.select(
            "OWNER_TABLE = ?1 AND OWNER_ID = ?2",
            params![owner.table, owner.id],
        )
    }

    fn incoming(&self, property: &ProtectionEntry) -> Result<Vec<Edge>, ProtectionError> {
        self.select(
            "PROPERTY_TABLE = ?1 AND PROPERTY_ID = ?2",
            params![property.table, property.id],
        )
    }

    fn contains(&self, edge: &Edge) -> Result<bool, ProtectionError> {
        let (owner_table, owner_id) = owner_columns(edge);
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT COUNT(*) FROM {} WHERE OWNER_TABLE IS ?1 AND OWNER_ID IS ?2 \
             AND PROPERTY_TABLE = ?3 AND PROPERTY_ID = ?4 AND RELATION_NAME IS ?5",
            self.table
        ))?;
        let count: i64 = stmt.query_row(
            params![
                owner_table,
                owner_id,
                edge.property.table,
                edge.property.id,
                edge.relation
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_batch(&mut self, edges: &[Edge]) -> Result<usize, ProtectionError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table, COLUMNS
        ))?;
        let mut written = 0;
        for edge in edges {
            let (owner_table, owner_id) = owner_columns(edge);
            written += stmt.execute(params![
                owner_table,
                owner_id,
                edge.property.table,
                edge.property.id,
                edge.property_class,
                edge.relation
            ])?;
        }
        Ok(written)
    }

    fn remove_owner_edges(&mut self, owner: &ProtectionEntry) -> Result<usize, ProtectionError> {
        Ok(self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE OWNER_TABLE = ?1 AND OWNER_ID = ?2",
                self.table
            ),
            params![owner.table, owner.id],
        )?)
    }

    fn remove_pin(&mut self, property: &ProtectionEntry) -> Result<usize, ProtectionError> {
        Ok(self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE OWNER_TABLE IS NULL AND OWNER_ID IS NULL \
                 AND PROPERTY_TABLE = ?1 AND PROPERTY_ID = ?2",
                self.table
            ),
            params![property.table, property.id],
        )?)
    }
}

fn owner_columns(edge: &Edge) -> (Option<&str>, Option<i64>) {
    match &edge.owner {
        Some(owner) => (Some(owner.table.as_str()), Some(owner.id)),
        None => (None, None),
    }
}
