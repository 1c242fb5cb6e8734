use thiserror::Error;

/// Failures that end an inbound request before any command runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
}

/// What the network caller is allowed to learn about a rejection: a status
/// category and nothing about which check failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("method not allowed: {message}")]
    MethodNotAllowed { message: String, correlation_id: String },
    #[error("unsupported media type: {message}")]
    UnsupportedMediaType { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            Self::UnsupportedMediaType { .. } => 415,
            Self::Unauthorized { .. } => 401,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::MethodNotAllowed { correlation_id, .. }
            | Self::UnsupportedMediaType { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::MethodNotAllowed { correlation_id: id, .. }
            | InterfaceError::UnsupportedMediaType { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::MethodNotAllowed(message) => {
                Self::MethodNotAllowed { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::UnsupportedMediaType(message) => {
                Self::UnsupportedMediaType { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Authentication(message) => {
                Self::Unauthorized { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
