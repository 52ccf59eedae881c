//! Shared primitives for the prism gateway
//!
//! Request context, per-call transport overrides, the `HttpError` trait,
//! and outbound header rules. Feature crates depend on this instead of
//! on each other.

mod context;
mod error;
mod headers;

pub use context::{AzureCredentials, CallOverrides, RequestContext};
pub use error::HttpError;
pub use headers::{
    HeaderForward, HeaderInsert, HeaderPattern, HeaderRemove, HeaderRule, NameOrPattern, apply_header_rules,
    is_header_denied,
};
