//! Reading progress manager for Readlog.
//!
//! Every operation here is a pure function over a book's reading state:
//! it validates the requested mutation and returns a new record with all
//! derived fields (progress, pages read, days to read) filled in. Nothing is
//! persisted; callers hand the result to a store.

mod error;
mod lifecycle;
mod validation;

pub use error::*;
pub use lifecycle::*;
pub use validation::*;
