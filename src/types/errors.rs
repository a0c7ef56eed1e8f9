use std::fmt;

// === StorageError ===

/// Errors related to reading and writing bookmark files.
#[derive(Debug)]
pub enum StorageError {
    /// An I/O error occurred while reading or writing a bookmark file.
    Io(String),
    /// The structured bookmark file contains a syntax error.
    Syntax { line: usize, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "Bookmark file I/O error: {}", msg),
            StorageError::Syntax { line, message } => {
                write!(f, "Bookmark file syntax error on line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

// === FetchError ===

/// Errors related to fetching remote link lists.
#[derive(Debug)]
pub enum FetchError {
    /// The URL could not be parsed or has no host.
    InvalidUrl(String),
    /// No fetcher handles the URL's scheme.
    UnsupportedScheme(String),
    /// A connection or transfer error occurred.
    Network(String),
    /// The TLS handshake failed.
    Tls(String),
    /// The server sent a malformed response.
    InvalidResponse(String),
    /// The request did not complete in time.
    Timeout(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            FetchError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported URL scheme: {}", scheme)
            }
            FetchError::Network(msg) => write!(f, "Fetch network error: {}", msg),
            FetchError::Tls(msg) => write!(f, "Fetch TLS error: {}", msg),
            FetchError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            FetchError::Timeout(url) => write!(f, "Fetch timed out: {}", url),
        }
    }
}

impl std::error::Error for FetchError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
