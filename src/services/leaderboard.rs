use crate::board::Leaderboard;
use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::ranking::Outcome;
use crate::validation;
use chrono::Utc;
use tracing::{debug, info};

pub fn submit_score(board: &Leaderboard, req: Submission) -> Result<SubmitResponse, AppError> {
    let entry = validation::validate_submission(req, Utc::now())?;
    let name = entry.name.clone();
    let score = entry.score;

    // rejections are saved too, the store always mirrors the last state
    let outcome = board.mutate(|engine, ranking| Ok(engine.submit(ranking, entry)?))?;

    Ok(match outcome {
        Outcome::Accepted { rank } => {
            info!(%name, score, ?rank, "score accepted");
            SubmitResponse::accepted(rank)
        }
        Outcome::Rejected(reason) => {
            debug!(%name, score, ?reason, "score rejected");
            SubmitResponse::rejected(reason)
        }
    })
}

pub fn get_leaderboard(board: &Leaderboard, limit: Option<usize>) -> Vec<Entry> {
    board.read(|engine, ranking| {
        let entries = engine.query(ranking);
        let limit = limit
            .unwrap_or(entries.len())
            .min(engine.capacity())
            .max(1);
        entries.iter().take(limit).cloned().collect()
    })
}

pub fn clear_leaderboard(board: &Leaderboard) -> Result<(), AppError> {
    board.mutate(|engine, _| Ok((engine.reset(), ())))?;
    info!("leaderboard cleared");
    Ok(())
}
