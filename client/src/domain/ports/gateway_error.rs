//! Errors shared by every remote data gateway port.

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Errors raised by gateway adapters.
    ///
    /// Every variant carries the human-readable message the backend (or the
    /// transport) produced; slices store that message verbatim.
    pub enum GatewayError {
        /// The backend could not be reached or timed out.
        Connection { message: String } =>
            "gateway connection failed: {message}",
        /// The credential source had no valid credentials.
        Unauthorized { message: String } =>
            "gateway rejected credentials: {message}",
        /// The record does not exist (or is not visible to this user).
        NotFound { message: String } =>
            "record not found: {message}",
        /// The backend refused the request.
        Rejected { message: String } =>
            "gateway rejected request: {message}",
        /// The response could not be decoded.
        Decode { message: String } =>
            "gateway response could not be decoded: {message}",
    }
}

impl GatewayError {
    /// Message reported by the backend or transport.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message }
            | Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Rejected { message }
            | Self::Decode { message } => message.as_str(),
        }
    }
}

impl From<GatewayError> for Error {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Connection { message } => Error::service_unavailable(message),
            GatewayError::Unauthorized { message } => Error::unauthorized(message),
            GatewayError::NotFound { message } => Error::not_found(message),
            GatewayError::Rejected { message } => Error::invalid_request(message),
            GatewayError::Decode { message } => Error::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for gateway error mapping.

    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(GatewayError::connection("timed out"), ErrorCode::ServiceUnavailable)]
    #[case(GatewayError::unauthorized("token expired"), ErrorCode::Unauthorized)]
    #[case(GatewayError::not_found("goal g-9"), ErrorCode::NotFound)]
    #[case(GatewayError::rejected("title required"), ErrorCode::InvalidRequest)]
    #[case(GatewayError::decode("missing field id"), ErrorCode::InternalError)]
    fn maps_onto_domain_codes(#[case] error: GatewayError, #[case] code: ErrorCode) {
        let message = error.message().to_owned();
        let mapped = Error::from(error);
        assert_eq!(mapped.code(), code);
        assert_eq!(mapped.message(), message);
    }

    #[rstest]
    fn display_includes_context() {
        let error = GatewayError::connection("refused");
        assert_eq!(error.to_string(), "gateway connection failed: refused");
        assert_eq!(error.label(), "connection");
    }
}
