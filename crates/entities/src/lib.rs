//! Core entity definitions for Readlog.
//!
//! This crate defines the data types shared across the Readlog workspace:
//! books and their reading state, users, password resets and the library
//! view helpers (sorting and per-status counts).

mod book;
mod library;
mod user;

pub use book::*;
pub use library::*;
pub use user::*;
