//! CRUD Integration Tests
//!
//! End-to-end tests of the statement builders running against the in-memory
//! session:
//! - Collections: add, find, modify, remove
//! - Tables and views: insert, select, update, delete
//! - Raw SQL with positional binding
//! - Transactions and session state
//! - Dynamic invocation by method name
//! - Configuration and stored sessions

mod common;

mod collection;
mod config;
mod dynamic;
mod sql;
mod table;
mod transactions;
