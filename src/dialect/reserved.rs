use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    /// SQL:2016 reserved words plus the short keywords most engines reject as identifiers
    pub static ref ANSI_RESERVED: HashSet<&'static str> = [
        "ABS", "ADD", "ALL", "ALTER", "AND", "ANY", "ARE", "ARRAY", "AS", "ASC", "AT", "AVG",
        "BEGIN", "BETWEEN", "BIGINT", "BINARY", "BIT", "BLOB", "BOOLEAN", "BOTH", "BY",
        "CALL", "CASE", "CAST", "CHAR", "CHECK", "CLOSE", "COLUMN", "COMMIT", "CONNECT",
        "CONSTRAINT", "COUNT", "CREATE", "CROSS", "CUBE", "CURRENT", "CURSOR", "CYCLE",
        "DATE", "DAY", "DEC", "DECIMAL", "DECLARE", "DEFAULT", "DELETE", "DESC", "DISTINCT",
        "DO", "DOUBLE", "DROP", "EACH", "ELSE", "END", "ESCAPE", "EXCEPT", "EXEC", "EXISTS",
        "FALSE", "FETCH", "FILTER", "FLOAT", "FOR", "FOREIGN", "FREE", "FROM", "FULL",
        "FUNCTION", "GET", "GLOBAL", "GO", "GRANT", "GROUP", "HAVING", "HOUR", "IF", "IN",
        "INDEX", "INNER", "INSERT", "INT", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "IS",
        "JOIN", "KEY", "LEFT", "LIKE", "LIMIT", "LOCAL", "MAP", "MATCH", "MAX", "MERGE", "MIN",
        "MINUTE", "MOD", "MONTH", "NATURAL", "NEW", "NO", "NONE", "NOT", "NULL", "NUMERIC",
        "OF", "OFF", "OFFSET", "OLD", "ON", "ONLY", "OPEN", "OR", "ORDER", "OUT", "OUTER",
        "OVER", "PAD", "PRIMARY", "REAL", "REF", "REFERENCES", "RETURN", "REVOKE", "RIGHT",
        "ROLLBACK", "ROW", "ROWS", "SECOND", "SELECT", "SET", "SIZE", "SMALLINT", "SOME",
        "SQL", "START", "SUM", "TABLE", "THEN", "TIME", "TO", "TOP", "TRUE", "UNION",
        "UNIQUE", "UNKNOWN", "UPDATE", "USE", "USER", "USING", "VALUE", "VALUES", "VIEW",
        "WHEN", "WHERE", "WINDOW", "WITH", "YEAR", "ZONE",
    ]
    .into_iter()
    .collect();

    /// Additional keywords reserved by SQLite
    pub static ref SQLITE_RESERVED: HashSet<&'static str> = [
        "ABORT", "ACTION", "AFTER", "ANALYZE", "ATTACH", "AUTOINCREMENT", "BEFORE", "CASCADE",
        "COLLATE", "CONFLICT", "DATABASE", "DEFERRABLE", "DEFERRED", "DETACH", "EXCLUSIVE",
        "EXPLAIN", "FAIL", "GLOB", "IGNORE", "IMMEDIATE", "INDEXED", "INITIALLY", "INSTEAD",
        "ISNULL", "NOTHING", "NOTNULL", "PLAN", "PRAGMA", "QUERY", "RAISE", "RECURSIVE",
        "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT", "ROWID",
        "SAVEPOINT", "TEMP", "TEMPORARY", "TRANSACTION", "TRIGGER", "VACUUM", "VIRTUAL",
    ]
    .into_iter()
    .collect();
}
