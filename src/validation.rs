use crate::error::AppError;
use crate::models::leaderboard::{date_format, Entry, Submission};
use chrono::{DateTime, Utc};
use serde_json::Value;

const MAX_PLAYER_NAME_LEN: usize = 64;

pub fn validate_name(name: &Value) -> Result<String, AppError> {
    match name.as_str().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => {
            Ok(trimmed.chars().take(MAX_PLAYER_NAME_LEN).collect())
        }
        _ => Err(AppError::InvalidInput("name must be a non-empty string".into())),
    }
}

pub fn validate_score(score: &Value) -> Result<f64, AppError> {
    score
        .as_f64()
        .filter(|s| s.is_finite())
        .ok_or_else(|| AppError::InvalidInput("score must be a number".into()))
}

pub fn validate_time_used(time_used: &Value) -> Result<Option<f64>, AppError> {
    match time_used {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_f64() {
            Some(t) if t >= 0.0 => Ok(Some(t)),
            _ => Err(AppError::InvalidInput("timeUsed cannot be negative".into())),
        },
        _ => Err(AppError::InvalidInput("timeUsed must be a number".into())),
    }
}

pub fn validate_all_flipped(flag: &Value) -> Result<Option<bool>, AppError> {
    match flag {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        _ => Err(AppError::InvalidInput("allFlipped must be a boolean".into())),
    }
}

/// Missing dates are stamped with `now`. Numbers are read as epoch
/// milliseconds.
pub fn validate_date(date: &Value, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    if date.is_null() {
        return Ok(now);
    }
    date_format::from_value(date)
        .ok_or_else(|| AppError::InvalidInput("date must be an ISO-8601 date".into()))
}

/// Decodes a request body. Anything that isn't a JSON object is rejected as
/// invalid input, whatever the `Content-Type` said.
pub fn parse_submission(body: &[u8]) -> Result<Submission, AppError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid score data: {}", e)))?;
    if !raw.is_object() {
        return Err(AppError::InvalidInput(
            "Invalid score data: expected a JSON object".into(),
        ));
    }
    serde_json::from_value(raw)
        .map_err(|e| AppError::InvalidInput(format!("Invalid score data: {}", e)))
}

pub fn validate_submission(req: Submission, now: DateTime<Utc>) -> Result<Entry, AppError> {
    Ok(Entry {
        name: validate_name(&req.name)?,
        score: validate_score(&req.score)?,
        time_used: validate_time_used(&req.time_used)?,
        all_flipped: validate_all_flipped(&req.all_flipped)?,
        date: Some(validate_date(&req.date, now)?),
        extra: req.extra,
    })
}
