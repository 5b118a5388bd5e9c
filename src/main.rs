mod board;
mod config;
mod error;
mod handlers;
mod models;
mod ranking;
mod services;
mod store;
mod validation;

use board::Leaderboard;
use config::{Config, LogFormat};
use ntex::web;
use ntex_cors::Cors;
use ranking::RankingEngine;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[ntex::main]
async fn main() -> io::Result<()> {
    let config = Config::load().map_err(io::Error::other)?;
    init_tracing(config.log_format);

    let store = store::open(config.backend, &config.store_path).map_err(io::Error::other)?;
    let engine = RankingEngine::new(config.policy, config.capacity);
    let board = Arc::new(Leaderboard::open(engine, store).map_err(io::Error::other)?);

    info!(
        host = %config.host,
        port = config.port,
        backend = %config.backend,
        path = %config.store_path.display(),
        policy = %config.policy,
        capacity = config.capacity,
        "leaderboard server starting"
    );

    web::HttpServer::new(move || {
        web::App::new()
            .state(board.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            .configure(routes)
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::resource("/leaderboard")
                .route(web::post().to(handlers::leaderboard::submit_score))
                .route(web::get().to(handlers::leaderboard::get_leaderboard))
                .route(web::delete().to(handlers::leaderboard::clear_leaderboard)),
        )
        .route(
            "/leaderboard/top10",
            web::get().to(handlers::leaderboard::get_top10),
        );
}

async fn health(board: web::types::State<Arc<Leaderboard>>) -> web::HttpResponse {
    let entries = board.read(|_, ranking| ranking.len());
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": board.backend(),
        "policy": board.engine().policy().as_str(),
        "entries": entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::leaderboard::Entry;
    use ntex::http::StatusCode;
    use ntex::web::test;
    use ranking::Policy;
    use serde_json::{json, Value};
    use store::MemoryStore;

    fn board(policy: Policy) -> Arc<Leaderboard> {
        Arc::new(
            Leaderboard::open(RankingEngine::new(policy, 10), Box::new(MemoryStore::new()))
                .unwrap(),
        )
    }

    #[ntex::test]
    async fn test_submit_then_query_over_http() {
        let app = test::init_service(
            web::App::new()
                .state(board(Policy::Append))
                .configure(routes),
        )
        .await;

        for (name, score, time) in [("A", 100, 50), ("B", 100, 30), ("C", 7, 1)] {
            let req = test::TestRequest::post()
                .uri("/leaderboard")
                .set_json(&json!({ "name": name, "score": score, "timeUsed": time }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/leaderboard/top10").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let entries: Vec<Entry> = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);

        let req = test::TestRequest::get().uri("/leaderboard?limit=1").to_request();
        let resp = test::call_service(&app, req).await;
        let entries: Vec<Entry> = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[ntex::test]
    async fn test_invalid_submission_is_bad_request() {
        let app = test::init_service(
            web::App::new()
                .state(board(Policy::Append))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/leaderboard")
            .set_json(&json!({ "name": "", "score": 5 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["error"], json!("name must be a non-empty string"));
    }

    #[ntex::test]
    async fn test_undecodable_body_is_json_error() {
        let app = test::init_service(
            web::App::new()
                .state(board(Policy::Append))
                .configure(routes),
        )
        .await;

        for payload in ["not json", "[1,2]", ""] {
            let req = test::TestRequest::post()
                .uri("/leaderboard")
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
            assert!(body["error"].is_string());
        }

        // a valid body without a Content-Type header is still accepted
        let req = test::TestRequest::post()
            .uri("/leaderboard")
            .set_payload(r#"{"name":"ada","score":1}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[ntex::test]
    async fn test_rejection_and_reset_over_http() {
        let board = board(Policy::DedupByName);
        let app = test::init_service(
            web::App::new()
                .state(board.clone())
                .configure(routes),
        )
        .await;

        for (score, expected) in [(50, StatusCode::CREATED), (10, StatusCode::OK)] {
            let req = test::TestRequest::post()
                .uri("/leaderboard")
                .set_json(&json!({ "name": "ada", "score": score }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
        assert_eq!(board.snapshot().len(), 1);
        assert_eq!(board.snapshot()[0].score, 50.0);

        let req = test::TestRequest::delete().uri("/leaderboard").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(board.snapshot().is_empty());
    }

    #[ntex::test]
    async fn test_health() {
        let app = test::init_service(
            web::App::new()
                .state(board(Policy::Append))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["backend"], json!("memory"));
        assert_eq!(body["entries"], json!(0));
    }
}
