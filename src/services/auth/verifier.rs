use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;

use crate::services::auth::decision::RejectReason;

/// Signing algorithms accepted by the gate. Anything else is rejected before
/// the signature is looked at.
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Shared-secret (HMAC) token verifier.
///
/// - Claims are decoded as opaque JSON and dropped; only the signature matters.
/// - No claim is required. `exp`/`nbf` are still enforced when a token carries them.
#[derive(Debug, Clone)]
pub struct HmacVerifier {
    validation: Validation,
}

impl Default for HmacVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HmacVerifier {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self { validation }
    }

    /// Verify `token` (raw compact JWT, no `Bearer ` scheme) against `secret`.
    pub fn verify(&self, token: &str, secret: &[u8]) -> Result<(), RejectReason> {
        let header = jsonwebtoken::decode_header(token).map_err(|e| {
            // jsonwebtoken refuses `alg` names it does not know (e.g. "none").
            match raw_alg(token) {
                Some(alg) if !is_hmac_name(&alg) => {
                    tracing::debug!(%alg, "token algorithm is not HMAC");
                    RejectReason::DisallowedAlgorithm
                }
                _ => {
                    tracing::debug!(error = %e, "cannot decode token header");
                    RejectReason::InvalidToken
                }
            }
        })?;

        if !HMAC_ALGORITHMS.contains(&header.alg) {
            tracing::debug!(alg = ?header.alg, "token algorithm is not HMAC");
            return Err(RejectReason::DisallowedAlgorithm);
        }

        let key = DecodingKey::from_secret(secret);
        jsonwebtoken::decode::<serde_json::Value>(token, &key, &self.validation)
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                map_jwt_error(e.kind())
            })
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// `alg` of the first segment, read without jsonwebtoken's algorithm enum.
fn raw_alg(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice::<RawHeader>(&bytes).ok().map(|h| h.alg)
}

fn is_hmac_name(alg: &str) -> bool {
    matches!(alg, "HS256" | "HS384" | "HS512")
}

fn map_jwt_error(kind: &ErrorKind) -> RejectReason {
    match kind {
        ErrorKind::InvalidSignature => RejectReason::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            RejectReason::DisallowedAlgorithm
        }
        _ => RejectReason::InvalidToken,
    }
}
