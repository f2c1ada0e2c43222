//! SQLite pricing store.
//!
//! This module provides:
//! - Database initialization, pragmas and schema
//! - Repository for the catalogue, scales and factor sheet

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
