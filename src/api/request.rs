//! Prediction request parsing and validation

use reqwest::Url;
use serde_json::Value;

use crate::{find_team, NbaError, Result, Team};

pub const MISSING_FIELDS: &str = "Missing team1 or team2 abbreviation or home court advantage.";
pub const INVALID_HOME: &str = "home court advantage can only be 0 or 1.";
pub const UNKNOWN_TEAM: &str = "Invalid team abbreviation provided.";

/// Raw request fields as they arrived, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictRequest {
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub home: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matchup {
    pub team1: Team,
    pub team2: Team,
    /// 1.0 when team1 plays at home
    pub home: f32,
}

impl PredictRequest {
    pub fn new(team1: &str, team2: &str, home: &str) -> Self {
        PredictRequest {
            team1: Some(team1.to_string()),
            team2: Some(team2.to_string()),
            home: Some(home.to_string()),
        }
    }

    /// Fields from a query string such as `team1=BOS&team2=LAL&home=1`
    pub fn from_query(query: &str) -> Result<Self> {
        let query = query.trim_start_matches('?');
        let url = Url::parse(&format!("http://localhost/?{}", query))
            .map_err(|e| NbaError::Validation(format!("Malformed query string: {}", e)))?;

        let mut request = PredictRequest::default();
        for (name, value) in url.query_pairs() {
            let slot = match &*name {
                "team1" => &mut request.team1,
                "team2" => &mut request.team2,
                "home" => &mut request.home,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        Ok(request)
    }

    /// Fields from a JSON object body; numbers are accepted for `home`
    pub fn from_body(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(PredictRequest::default());
        }
        let value: Value = serde_json::from_str(body)
            .map_err(|e| NbaError::Validation(format!("Malformed request body: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| NbaError::Validation("Request body must be a JSON object".to_string()))?;

        Ok(PredictRequest {
            team1: object.get("team1").and_then(field_text),
            team2: object.get("team2").and_then(field_text),
            home: object.get("home").and_then(field_text),
        })
    }

    /// Query values win field by field; the body fills whatever the query lacks
    pub fn merge(query: PredictRequest, body: PredictRequest) -> Self {
        PredictRequest {
            team1: present(query.team1).or(present(body.team1)),
            team2: present(query.team2).or(present(body.team2)),
            home: present(query.home).or(present(body.home)),
        }
    }

    /// `query` with every field set here appended, so these values win when the
    /// result is parsed by `from_query`
    pub fn overlay_query(&self, query: Option<&str>) -> Result<Option<String>> {
        let mut url = Url::parse("http://localhost/")
            .map_err(|e| NbaError::Validation(format!("Malformed query string: {}", e)))?;
        url.set_query(query.map(|q| q.trim_start_matches('?')));

        let fields = [("team1", &self.team1), ("team2", &self.team2), ("home", &self.home)];
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in fields {
                if let Some(value) = present(value.clone()) {
                    pairs.append_pair(name, &value);
                }
            }
        }
        Ok(url.query().filter(|q| !q.is_empty()).map(String::from))
    }

    /// Every field present and non-blank
    pub fn is_complete(&self) -> bool {
        [&self.team1, &self.team2, &self.home]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Parse the query, and the body only when the query leaves a field out
    pub fn from_parts(query: Option<&str>, body: Option<&str>) -> Result<Self> {
        let query = match query {
            Some(q) => PredictRequest::from_query(q)?,
            None => PredictRequest::default(),
        };
        if query.is_complete() {
            return Ok(query);
        }
        let body = match body {
            Some(b) => PredictRequest::from_body(b)?,
            None => PredictRequest::default(),
        };
        Ok(PredictRequest::merge(query, body))
    }

    /// Presence first, then the home flag, then the team table
    pub fn validate(&self) -> Result<Matchup> {
        let (team1, team2, home) = match (
            present(self.team1.clone()),
            present(self.team2.clone()),
            present(self.home.clone()),
        ) {
            (Some(t1), Some(t2), Some(h)) => (t1, t2, h),
            _ => return Err(NbaError::Validation(MISSING_FIELDS.to_string())),
        };

        let home = match home.trim() {
            "0" => 0.0,
            "1" => 1.0,
            _ => return Err(NbaError::Validation(INVALID_HOME.to_string())),
        };

        match (find_team(&team1), find_team(&team2)) {
            (Some(team1), Some(team2)) => Ok(Matchup { team1, team2, home }),
            _ => Err(NbaError::NotFound(UNKNOWN_TEAM.to_string())),
        }
    }
}

/// Non-blank values only
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some("0".to_string()),
            Some(x) if x == 1.0 => Some("1".to_string()),
            _ => Some(n.to_string()),
        },
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
