use std::borrow::Cow;

/// Top-level error for request validation.
///
/// This enum wraps all possible request validation errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Error building an account registration request.
    #[error("register account error: {0}")]
    RegisterAccount(#[from] RegisterAccountRequestError),
}

/// Errors that can occur when validating an account registration request.
#[derive(Debug, thiserror::Error)]
pub enum RegisterAccountRequestError {
    /// The signer list is empty
    #[error("empty signers error")]
    EmptySigners,

    /// The signer list names the same key more than once
    #[error("duplicate signer error")]
    DuplicateSigner,

    /// The threshold exceeds the combined signer weight
    #[error("excess threshold error: threshold exceeds combined signer weight")]
    ExcessThreshold,

    /// Other validation error
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}
