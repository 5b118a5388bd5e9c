use crate::ranking::RejectReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A ranked result as stored and served.
///
/// Fields the ranking does not know about are kept in `extra` and written
/// back out untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_flipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date_format")]
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
impl Entry {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Entry {
            name: name.into(),
            score,
            time_used: None,
            all_flipped: None,
            date: None,
            extra: Map::new(),
        }
    }

    pub fn with_time_used(mut self, time_used: f64) -> Self {
        self.time_used = Some(time_used);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Raw submission body. Typed checks happen in `validation`, so a bad field
/// becomes a 400 with a useful message instead of a generic decode failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub score: Value,
    #[serde(default)]
    pub time_used: Value,
    #[serde(default)]
    pub all_flipped: Value,
    #[serde(default)]
    pub date: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    pub message: String,
}

impl SubmitResponse {
    pub fn accepted(rank: Option<usize>) -> Self {
        SubmitResponse {
            accepted: true,
            rank,
            reason: None,
            message: "Score submitted successfully".into(),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        SubmitResponse {
            accepted: false,
            rank: None,
            reason: Some(reason),
            message: "Score is not an improvement on the existing entry".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// Dates go out as RFC 3339 with milliseconds and a `Z` suffix. Coming in,
/// anything `from_value` understands is accepted; stored values it can't read
/// are treated as missing rather than failing the whole load.
pub mod date_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Strings go through [`parse`]; numbers are epoch milliseconds.
    pub fn from_value(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(raw) => parse(raw),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|ms| ms as i64))
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            _ => None,
        }
    }

    pub fn format(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Value> = Option::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(from_value))
    }
}
