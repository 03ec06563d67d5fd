//! Request extractors.

use axum::extract::FromRequest;

use crate::error::ServerError;

/// JSON body extractor whose rejections use the API error body.
///
/// Bodies that fail to parse or do not fit the request type (a negative page,
/// an unknown status, a malformed date) answer 400 `INVALID_REQUEST`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);
