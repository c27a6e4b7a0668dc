//! Response envelope
//!
//! The only place where an error kind becomes a status code.

use serde::Serialize;
use serde_json::{json, Value};

use crate::predict::{PredictionResult, StageError, StageResult};
use crate::ErrorKind;

/// Status code and JSON body handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    #[serde(rename = "statusCode")]
    pub status: u16,
    pub body: Value,
}

pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::Dependency | ErrorKind::Data => 500,
    }
}

impl ApiResponse {
    pub fn ok(result: &PredictionResult) -> Self {
        ApiResponse {
            status: 200,
            body: serde_json::to_value(result)
                .unwrap_or_else(|e| json!({ "error": e.to_string() })),
        }
    }

    pub fn from_error(err: &StageError) -> Self {
        let status = status_for(err.kind());
        if status >= 500 {
            log::error!("Request failed at {} stage: {}", err.stage, err);
        } else {
            log::warn!("Request rejected at {} stage: {}", err.stage, err);
        }
        ApiResponse {
            status,
            body: json!({ "error": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

impl From<StageResult<PredictionResult>> for ApiResponse {
    fn from(result: StageResult<PredictionResult>) -> Self {
        match result {
            Ok(prediction) => ApiResponse::ok(&prediction),
            Err(err) => ApiResponse::from_error(&err),
        }
    }
}
