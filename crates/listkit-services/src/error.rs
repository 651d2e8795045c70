use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} transport error: {message}")]
    Http {
        service: &'static str,
        message: String,
    },
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("invalid response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ServiceError {
    /// True when the remote side reported that the requested object does not
    /// exist, either through an explicit 404 or a backend-level miss.
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Status { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// HTTP status attached to the failure, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
