use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid session key {0:?}")]
    InvalidSessionKey(String),

    #[error("invalid participant id {0:?}")]
    InvalidParticipantId(String),

    #[error("invalid storage name {0:?}")]
    InvalidStorageName(String),
}
