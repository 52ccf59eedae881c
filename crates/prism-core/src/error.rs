use http::StatusCode;

/// Trait for domain errors that surface as HTTP responses
///
/// Each feature crate implements this on its own error type; the inbound
/// layer turns implementors into wire responses without the domain crates
/// depending on axum.
pub trait HttpError: std::error::Error {
    /// Status code to respond with
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type slug (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to show to API consumers
    fn client_message(&self) -> String;
}
