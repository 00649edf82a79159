//! Request extractors whose rejections render as [`ApiError`]
//!
//! axum's own `Json`, `Query` and `Path` answer malformed input with a plain
//! text body. Handlers take these wrappers instead so every failure keeps the
//! `{ "success": false, "error": ... }` shape.

use axum::extract::{FromRequest, FromRequestParts};

use crate::api::middleware::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
