//! Unit tests - Fast, isolated tests against the public API
//!
//! These tests exercise single components without a database.

mod alias_tests;
mod dialect_tests;
mod path_enumeration_tests;
