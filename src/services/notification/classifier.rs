use crate::domain::push::FailureCode;

/// What to do after a failed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Transient backend condition, try again after backing off.
    Retry,
    /// The token can never be delivered to, disable it and stop.
    InvalidateToken,
    /// Provider-side or environment problem unrelated to the token, stop without touching it.
    StopOnly,
}

/// Maps a provider failure code to the action the executor takes.
///
/// Unrecognized codes never retry.
#[must_use]
pub fn classify(code: &FailureCode) -> Decision {
    match code {
        FailureCode::Internal | FailureCode::Unavailable | FailureCode::QuotaExceeded => Decision::Retry,
        FailureCode::Unregistered | FailureCode::InvalidArgument => Decision::InvalidateToken,
        FailureCode::SenderIdMismatch
        | FailureCode::ThirdPartyAuthError
        | FailureCode::UnspecifiedError
        | FailureCode::Other(_) => Decision::StopOnly,
    }
}
