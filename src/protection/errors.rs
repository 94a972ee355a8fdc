use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtectionError {
    /// Driver failure. The caller's transaction is expected to roll back.
    #[error("Edge table access failed: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("`{0}` is not usable as an edge table name")]
    InvalidTableName(String),

    #[error("Edge row has only one of OWNER_TABLE/OWNER_ID set (property {table}#{id})")]
    HalfOwnedEdge { table: String, id: i64 },
}
