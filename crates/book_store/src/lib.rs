//! Book storage for Readlog
//!
//! This crate provides the record read/write interface the HTTP layer
//! persists users, books and password resets through. It ships an in-memory
//! implementation (tests and throwaway instances) and a SQLite one.

mod error;
mod memory;
mod sqlite;
mod traits;

#[cfg(test)]
mod conformance;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
