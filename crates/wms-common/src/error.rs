//! Error types reported back to WMS clients.

use thiserror::Error;

/// Error surfaced to a WMS client as a service exception.
#[derive(Debug, Error)]
pub enum WmsError {
    // === Output Errors ===
    #[error("Failed to encode response: {0}")]
    EncodingError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl WmsError {
    /// Get the OGC WMS exception code for this error.
    pub fn wms_exception_code(&self) -> &'static str {
        match self {
            WmsError::EncodingError(_) | WmsError::InternalError(_) => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WmsError::EncodingError(_) | WmsError::InternalError(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_codes() {
        assert_eq!(
            WmsError::EncodingError("boom".into()).wms_exception_code(),
            "NoApplicableCode"
        );
        assert_eq!(
            WmsError::InternalError("bad srsName".into()).wms_exception_code(),
            "NoApplicableCode"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(WmsError::EncodingError("boom".into()).http_status_code(), 500);
        assert_eq!(WmsError::InternalError("bad srsName".into()).http_status_code(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WmsError::EncodingError("broken pipe".into()).to_string(),
            "Failed to encode response: broken pipe"
        );
    }
}
