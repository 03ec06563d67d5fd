//! HTTP protocol definitions for the Readlog server.
//!
//! Every body is JSON with camelCase fields. Successful responses carry
//! `success: true`; failures use [`ErrorBody`].

mod error;
pub mod requests;
pub mod responses;

pub use error::*;
