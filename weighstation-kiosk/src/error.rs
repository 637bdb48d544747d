use thiserror::Error;

/// Input rejected before any request leaves the kiosk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid card ID")]
    EmptyCardId,

    #[error("Invalid weight reading. Please check the scale.")]
    InvalidWeight(f64),

    #[error("Customer name is required")]
    EmptyCustomerName,
}

/// Failure of a kiosk operation.
///
/// `Display` is the text shown to the operator, so each variant renders its
/// message verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KioskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network failure, opaque non-2xx response, or an undecodable body.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Non-2xx response carrying a JSON `error` field.
    #[error("{message}")]
    Application { status: u16, message: String },
}

impl KioskError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            status: None,
            message: format!("Network error: {err}"),
        }
    }

    pub fn server_status(status: u16) -> Self {
        Self::Transport {
            status: Some(status),
            message: format!("Server error: {status}"),
        }
    }

    pub fn decode(status: u16, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            status: Some(status),
            message: format!("Invalid response from server: {err}"),
        }
    }

    pub fn application(status: u16, message: impl Into<String>) -> Self {
        Self::Application {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => None,
            Self::Transport { status, .. } => *status,
            Self::Application { status, .. } => Some(*status),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type KioskResult<T> = Result<T, KioskError>;
