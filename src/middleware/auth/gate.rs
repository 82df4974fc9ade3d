//! Passphrase (HMAC JWT) gate in front of every route.
//!
//! Per request, decided once and synchronously:
//! - store uninitialized + `PermitUnauthenticated` → forward
//! - exempt path (exact match) → forward
//! - store uninitialized + `Deny` → 503
//! - `Authorization: <jwt>` (raw, no `Bearer `) signed with the passphrase
//!   using HS256/384/512 → forward, anything else → 401
//!
//! A rejection always produces a response; the inner handler is never called.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{AllowList, AuthDecision, HmacVerifier, PassphraseStore, RejectReason};

/// What to do with non-exempt requests while no passphrase is established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UninitializedPolicy {
    #[default]
    Deny,
    /// Fail-open: forward everything until the passphrase exists.
    PermitUnauthenticated,
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    passphrase: Arc<PassphraseStore>,
    allow_list: Arc<AllowList>,
    verifier: HmacVerifier,
    uninitialized: UninitializedPolicy,
}

impl AuthGate {
    pub fn new(passphrase: Arc<PassphraseStore>, allow_list: AllowList) -> Self {
        Self {
            passphrase,
            allow_list: Arc::new(allow_list),
            verifier: HmacVerifier::new(),
            uninitialized: UninitializedPolicy::default(),
        }
    }

    pub fn with_uninitialized_policy(mut self, policy: UninitializedPolicy) -> Self {
        self.uninitialized = policy;
        self
    }

    pub fn decide(&self, path: &str, authorization: Option<&HeaderValue>) -> AuthDecision {
        let secret = self.passphrase.secret();

        if secret.is_none() && self.uninitialized == UninitializedPolicy::PermitUnauthenticated {
            return AuthDecision::Allow;
        }
        if self.allow_list.is_exempt(path) {
            return AuthDecision::Allow;
        }
        let Some(secret) = secret else {
            return AuthDecision::Reject(RejectReason::Uninitialized);
        };
        let Some(authorization) = authorization else {
            return AuthDecision::Reject(RejectReason::MissingHeader);
        };
        let Ok(token) = authorization.to_str() else {
            return AuthDecision::Reject(RejectReason::InvalidToken);
        };

        match self.verifier.verify(token, secret.expose()) {
            Ok(()) => AuthDecision::Allow,
            Err(reason) => AuthDecision::Reject(reason),
        }
    }
}

/// Put the gate in front of every route of `router`.
///
/// 例：
/// ```ignore
/// let app = Router::new().nest("/api/v1", api::v1::routes());
/// let app = middleware::auth::gate::apply(app, gate);
/// ```
pub fn apply<S>(router: Router<S>, gate: AuthGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, auth_gate_middleware))
}

async fn auth_gate_middleware(
    State(gate): State<AuthGate>,
    OriginalUri(original_uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = original_uri.path();
    let decision = gate.decide(path, req.headers().get(header::AUTHORIZATION));

    match decision {
        AuthDecision::Allow => {
            tracing::debug!(path, "request authorized");
            Ok(next.run(req).await)
        }
        AuthDecision::Reject(reason) => {
            tracing::warn!(path, %reason, "request rejected");
            Err(reason.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        http::StatusCode,
        routing::{get, post},
    };
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::passphrase::PASSPHRASE_FILE_NAME;

    struct Harness {
        router: Router,
        hits: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new(gate: AuthGate) -> Self {
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = {
                let hits = hits.clone();
                move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "inner"
                    }
                }
            };

            let router = Router::new()
                .route("/api/v1/ping", get(counter.clone()))
                .route("/api/v1/scoringmgr/score", get(counter.clone()))
                .route("/api/v1/servicemgr/services", get(counter.clone()))
                .route("/api/v1/other", get(counter.clone()))
                .route("/api/v1/orchestration/services", post(counter));

            Self {
                router: apply(router, gate),
                hits,
            }
        }

        async fn send(&self, method: &str, uri: &str, authorization: Option<&str>) -> StatusCode {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(value) = authorization {
                req = req.header(header::AUTHORIZATION, value);
            }
            let req = req.body(Body::empty()).expect("request");

            self.router
                .clone()
                .oneshot(req)
                .await
                .expect("infallible")
                .status()
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn initialized_store(dir: &TempDir) -> Arc<PassphraseStore> {
        let store = PassphraseStore::new();
        store.init(dir.path()).expect("init");
        Arc::new(store)
    }

    fn sign(secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "edge-node"}),
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to create test token")
    }

    #[tokio::test]
    async fn exempt_path_without_header_is_forwarded() {
        let dir = TempDir::new().expect("tempdir");
        let store = initialized_store(&dir);
        let harness = Harness::new(AuthGate::new(store, AllowList::default()));

        assert_eq!(harness.send("GET", "/api/v1/ping", None).await, StatusCode::OK);
        assert_eq!(harness.hits(), 1);
        assert!(dir.path().join(PASSPHRASE_FILE_NAME).is_file());
    }

    #[tokio::test]
    async fn exempt_path_ignores_a_bad_header() {
        let dir = TempDir::new().expect("tempdir");
        let harness = Harness::new(AuthGate::new(initialized_store(&dir), AllowList::default()));

        let status = harness
            .send("GET", "/api/v1/scoringmgr/score", Some("garbage"))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.hits(), 1);
    }

    #[tokio::test]
    async fn missing_header_is_rejected_with_401() {
        let dir = TempDir::new().expect("tempdir");
        let harness = Harness::new(AuthGate::new(initialized_store(&dir), AllowList::default()));

        let status = harness.send("GET", "/api/v1/other", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(harness.hits(), 0);
    }

    #[tokio::test]
    async fn token_signed_with_passphrase_is_forwarded() {
        let dir = TempDir::new().expect("tempdir");
        let store = initialized_store(&dir);
        let token = sign(store.secret().expect("secret").expose());
        let harness = Harness::new(AuthGate::new(store, AllowList::default()));

        let status = harness.send("GET", "/api/v1/other", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.hits(), 1);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let harness = Harness::new(AuthGate::new(initialized_store(&dir), AllowList::default()));
        let token = sign(b"not-the-passphrase");

        let status = harness.send("GET", "/api/v1/other", Some(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(harness.hits(), 0);
    }

    #[tokio::test]
    async fn bearer_scheme_is_not_stripped() {
        let dir = TempDir::new().expect("tempdir");
        let store = initialized_store(&dir);
        let token = sign(store.secret().expect("secret").expose());
        let harness = Harness::new(AuthGate::new(store, AllowList::default()));

        let status = harness
            .send("GET", "/api/v1/other", Some(&format!("Bearer {token}")))
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(harness.hits(), 0);
    }

    #[tokio::test]
    async fn token_survives_restart_with_same_directory() {
        let dir = TempDir::new().expect("tempdir");
        let token = sign(initialized_store(&dir).secret().expect("secret").expose());

        let restarted = initialized_store(&dir);
        let harness = Harness::new(AuthGate::new(restarted, AllowList::default()));

        let status = harness
            .send("POST", "/api/v1/orchestration/services", Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.hits(), 1);
    }

    #[tokio::test]
    async fn uninitialized_permit_forwards_everything() {
        let gate = AuthGate::new(Arc::new(PassphraseStore::new()), AllowList::default())
            .with_uninitialized_policy(UninitializedPolicy::PermitUnauthenticated);
        let harness = Harness::new(gate);

        assert_eq!(harness.send("GET", "/api/v1/other", None).await, StatusCode::OK);
        assert_eq!(
            harness.send("GET", "/api/v1/other", Some("garbage")).await,
            StatusCode::OK
        );
        assert_eq!(harness.send("GET", "/api/v1/ping", None).await, StatusCode::OK);
        assert_eq!(harness.hits(), 3);
    }

    #[tokio::test]
    async fn uninitialized_deny_only_forwards_exempt_paths() {
        let gate = AuthGate::new(Arc::new(PassphraseStore::new()), AllowList::default());
        let harness = Harness::new(gate);

        assert_eq!(
            harness.send("GET", "/api/v1/servicemgr/services", None).await,
            StatusCode::OK
        );
        assert_eq!(
            harness.send("GET", "/api/v1/other", Some("anything")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(harness.hits(), 1);
    }

    #[tokio::test]
    async fn permit_policy_is_inert_once_initialized() {
        let dir = TempDir::new().expect("tempdir");
        let gate = AuthGate::new(initialized_store(&dir), AllowList::default())
            .with_uninitialized_policy(UninitializedPolicy::PermitUnauthenticated);
        let harness = Harness::new(gate);

        let status = harness.send("GET", "/api/v1/other", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(harness.hits(), 0);
    }

    #[tokio::test]
    async fn nested_router_matches_on_the_full_path() {
        let dir = TempDir::new().expect("tempdir");
        let gate = AuthGate::new(initialized_store(&dir), AllowList::default());

        let inner = Router::new().route("/ping", get(|| async { "pong" }));
        let nested = apply(Router::new().nest("/api/v1", inner.clone()), gate.clone());
        let inside = Router::new().nest("/api/v1", apply(inner, gate));

        for router in [nested, inside] {
            let req = Request::builder()
                .uri("/api/v1/ping")
                .body(Body::empty())
                .expect("request");
            let status = router.oneshot(req).await.expect("infallible").status();
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[test]
    fn decide_reports_each_reject_reason() {
        let dir = TempDir::new().expect("tempdir");
        let store = initialized_store(&dir);
        let secret = store.secret().expect("secret").expose().to_vec();
        let gate = AuthGate::new(store, AllowList::default());
        let path = "/api/v1/other";

        assert_eq!(
            gate.decide(path, None),
            AuthDecision::Reject(RejectReason::MissingHeader)
        );

        let wrong = HeaderValue::from_str(&sign(b"wrong")).expect("header");
        assert_eq!(
            gate.decide(path, Some(&wrong)),
            AuthDecision::Reject(RejectReason::BadSignature)
        );

        let garbage = HeaderValue::from_static("garbage");
        assert_eq!(
            gate.decide(path, Some(&garbage)),
            AuthDecision::Reject(RejectReason::InvalidToken)
        );

        let opaque = HeaderValue::from_bytes(b"\xfftoken").expect("header");
        assert_eq!(
            gate.decide(path, Some(&opaque)),
            AuthDecision::Reject(RejectReason::InvalidToken)
        );

        let good = HeaderValue::from_str(&sign(&secret)).expect("header");
        assert_eq!(gate.decide(path, Some(&good)), AuthDecision::Allow);
    }

    #[test]
    fn brace_path_is_exempt_only_literally() {
        let dir = TempDir::new().expect("tempdir");
        let gate = AuthGate::new(initialized_store(&dir), AllowList::default());

        assert_eq!(
            gate.decide("/api/v1/servicemgr/services/notification/{serviceid}", None),
            AuthDecision::Allow
        );
        assert_eq!(
            gate.decide("/api/v1/servicemgr/services/notification/svc-1", None),
            AuthDecision::Reject(RejectReason::MissingHeader)
        );
    }

    #[test]
    fn gate_does_not_touch_a_preexisting_secret_file() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(PASSPHRASE_FILE_NAME), b"fixedsecret12345").expect("write");
        let gate = AuthGate::new(initialized_store(&dir), AllowList::default());
        let token = HeaderValue::from_str(&sign(b"fixedsecret12345")).expect("header");

        assert_eq!(
            gate.decide("/api/v1/other", Some(&token)),
            AuthDecision::Allow
        );
        assert_eq!(
            fs::read(dir.path().join(PASSPHRASE_FILE_NAME)).expect("read"),
            b"fixedsecret12345"
        );
    }
}
