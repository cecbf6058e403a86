use ::reqwest::StatusCode;

/// Failure classes the core branches on. Carried inside `anyhow::Error`;
/// recover it with [`ApiError::from_anyhow`].
#[derive(Debug)]
pub enum ApiError {
    /// Input rejected before anything was sent.
    Validation(String),
    /// No response was received.
    Transport(String),
    /// The server answered with a non-2xx status.
    Status { status: StatusCode, message: String },
    /// A 2xx response whose body did not have the expected shape.
    Decode(String),
}

impl ApiError {
    /// A not-found answer on a listing call means there are no more pages.
    pub fn is_end_of_data(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == StatusCode::NOT_FOUND,
            _ => false,
        }
    }

    pub fn from_anyhow(err: &::anyhow::Error) -> Option<&ApiError> {
        err.downcast_ref::<ApiError>()
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Validation(message)
            | ApiError::Transport(message)
            | ApiError::Decode(message)
            | ApiError::Status { message, .. } => message.as_str(),
        }
    }
}

impl ::std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            ApiError::Validation(message) => {
                write!(f, "invalid input: {}", message)
            }
            ApiError::Transport(message) => {
                write!(f, "request failed: {}", message)
            }
            ApiError::Status { status, message } => {
                write!(f, "server returned {}: {}", status, message)
            }
            ApiError::Decode(message) => {
                write!(f, "unexpected response: {}", message)
            }
        }
    }
}

impl ::std::error::Error for ApiError {}

pub fn is_end_of_data(err: &::anyhow::Error) -> bool {
    ApiError::from_anyhow(err).map_or(false, ApiError::is_end_of_data)
}
