//! Credential store error types.

/// Errors from the persisted key/value storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error: {message}")]
    Io { message: String },

    /// The backing file exists but isn't a JSON object of strings
    #[error("storage file is not valid JSON: {message}")]
    Json { message: String },
}

/// Errors from building credentialed requests.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The endpoint passed to `build_url` isn't a syntactically valid URL
    #[error("invalid endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}
