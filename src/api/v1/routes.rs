/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証の要否はここでは決めない (AllowList + AuthGate が app.rs で全体に掛かる)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    orchestration::request_service,
    ping::ping,
    scoringmgr::score,
    servicemgr::{list_services, notify_service},
};

pub fn routes() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/servicemgr/services", get(list_services))
        .route(
            "/servicemgr/services/notification/{serviceid}",
            post(notify_service),
        )
        .route("/scoringmgr/score", get(score))
        .route("/orchestration/services", post(request_service))
}
