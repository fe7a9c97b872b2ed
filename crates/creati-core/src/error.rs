use http::StatusCode;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. Keeps the status and
/// client-visible wording next to the error definition while the response
/// body shape stays a server concern.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Optional short detail for the client (never secrets or traces)
    fn client_details(&self) -> Option<String> {
        None
    }
}
