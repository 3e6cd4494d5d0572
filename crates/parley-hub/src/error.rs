use crate::types::ClientId;

/// Errors surfaced by the hub core.
///
/// None of these are fatal: the connection layer reports them back to
/// the client and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("client id already in use: {id}")]
    DuplicateIdentifier { id: ClientId },

    #[error("client id must not be empty")]
    EmptyIdentifier,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
