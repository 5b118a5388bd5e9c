use crate::board::Leaderboard;
use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::services::leaderboard as service;
use crate::validation;
use ntex::http::StatusCode;
use ntex::util::Bytes;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

const TOP_N: usize = 10;

pub async fn submit_score(
    board: web::types::State<Arc<Leaderboard>>,
    body: Bytes,
) -> Result<HttpResponse, AppError> {
    let req = validation::parse_submission(&body)?;
    let result = service::submit_score(&board, req)?;
    let status = if result.accepted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(HttpResponse::build(status).json(&result))
}

pub async fn get_leaderboard(
    board: web::types::State<Arc<Leaderboard>>,
    query: web::types::Query<LeaderboardQuery>,
) -> Result<HttpResponse, AppError> {
    let entries = service::get_leaderboard(&board, query.limit);
    Ok(HttpResponse::Ok().json(&entries))
}

pub async fn get_top10(
    board: web::types::State<Arc<Leaderboard>>,
) -> Result<HttpResponse, AppError> {
    let entries = service::get_leaderboard(&board, Some(TOP_N));
    Ok(HttpResponse::Ok().json(&entries))
}

pub async fn clear_leaderboard(
    board: web::types::State<Arc<Leaderboard>>,
) -> Result<HttpResponse, AppError> {
    service::clear_leaderboard(&board)?;
    Ok(HttpResponse::Ok().json(&serde_json::json!({ "cleared": true })))
}
