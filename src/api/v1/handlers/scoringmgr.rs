use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: f64,
}

/// GET /api/v1/scoringmgr/score
///
/// Fixed score; the scoring engine itself lives outside this service.
pub async fn score() -> Json<ScoreResponse> {
    Json(ScoreResponse { score: 1.0 })
}
