use thiserror::Error;

/// Error codes worth retrying; a code also matches when its prefix before
/// the first `.` is listed (e.g. `ResourceInUse.Namespace`)
pub const RETRYABLE_ERROR_CODES: &[&str] = &[
    "ClientError.NetworkError",
    "ClientError.HttpStatusCodeError",
    "FailedOperation",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
    "ResourceBusy",
    "InternalError",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    ServiceError {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to encode request: {0}")]
    EncodeError(#[from] serde_json::Error),

    #[error("Failed to sign request: {0}")]
    SigningError(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// How the reconciler should react to a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve after a delay
    Transient,
    /// The addressed resource does not exist
    NotFound,
    /// Validation, permission or malformed request; retrying cannot help
    Fatal,
}

impl ApiError {
    /// Service error code, when the API answered with one
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::ServiceError { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn classify(&self, extra_retryable: &[&str]) -> ErrorClass {
        match self {
            ApiError::ServiceError { code, .. } => classify_code(code, extra_retryable),
            ApiError::RequestError(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                ErrorClass::Transient
            }
            ApiError::HttpStatus { status, .. } if *status == 429 || *status >= 500 => {
                ErrorClass::Transient
            }
            _ => ErrorClass::Fatal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.classify(&[]) == ErrorClass::NotFound
    }
}

fn classify_code(code: &str, extra_retryable: &[&str]) -> ErrorClass {
    if is_not_found_code(code) {
        return ErrorClass::NotFound;
    }

    let prefix = code.split('.').next().unwrap_or(code);
    let retryable = RETRYABLE_ERROR_CODES
        .iter()
        .chain(extra_retryable.iter())
        .any(|candidate| *candidate == code || *candidate == prefix);

    if retryable {
        ErrorClass::Transient
    } else {
        ErrorClass::Fatal
    }
}

fn is_not_found_code(code: &str) -> bool {
    code == "ResourceNotFound"
        || code.starts_with("ResourceNotFound.")
        || code.ends_with("NotFound")
        || code.ends_with("NotExist")
        || code.ends_with("NotExists")
}
