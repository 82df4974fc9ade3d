/*
 * Responsibility
 * - AuthGate の判定結果 (Allow / Reject) と拒否理由の型
 * - HTTP への変換は error.rs 側 (ここは axum に依存しない)
 */
use thiserror::Error;

/// Outcome of the per-request authentication check.
///
/// `Allow` carries nothing: token claims are verified but never handed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("request doesn't contain an Authorization token")]
    MissingHeader,

    #[error("token is malformed or its claims are not valid")]
    InvalidToken,

    #[error("token signature does not match the current passphrase")]
    BadSignature,

    #[error("token is not signed with an HMAC algorithm")]
    DisallowedAlgorithm,

    // Only produced under UninitializedPolicy::Deny.
    #[error("passphrase has not been initialized")]
    Uninitialized,
}
