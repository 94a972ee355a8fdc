//! Integration tests - Components working together against an in-memory SQLite database
//!
//! These tests create real tables, run the generated SQL and read the edge table back.

mod query_by_example_tests;
mod safe_delete_tests;
