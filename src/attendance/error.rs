use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::portal::FALLBACK_FAILURE_MESSAGE;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttendanceError {
    #[error("Waiting for GPS...")]
    WaitingForLocation,

    #[error("GPS Access Required")]
    LocationAccessRequired,

    #[error("Outside Zone: {distance_m}m away.")]
    OutsideZone { distance_m: u64 },

    #[error("Reason too short")]
    ReasonTooShort { min: usize },

    #[error("Verification photo required")]
    PhotoRequired,

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// Portal answered with an explicit error result.
    #[error("{0}")]
    Rejected(String),

    /// Transport failure or timeout; the detail is only logged.
    #[error("{}", FALLBACK_FAILURE_MESSAGE)]
    Unreachable { detail: String },
}

impl AttendanceError {
    /// Detected before anything was sent; the attempt is untouched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AttendanceError::WaitingForLocation
                | AttendanceError::LocationAccessRequired
                | AttendanceError::OutsideZone { .. }
                | AttendanceError::ReasonTooShort { .. }
                | AttendanceError::PhotoRequired
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::WaitingForLocation => "waiting_for_location",
            AttendanceError::LocationAccessRequired => "location_access_required",
            AttendanceError::OutsideZone { .. } => "outside_zone",
            AttendanceError::ReasonTooShort { .. } => "reason_too_short",
            AttendanceError::PhotoRequired => "photo_required",
            AttendanceError::SubmissionInFlight => "submission_in_flight",
            AttendanceError::Rejected(_) => "rejected",
            AttendanceError::Unreachable { .. } => "unreachable",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_precondition() => StatusCode::BAD_REQUEST,
            AttendanceError::SubmissionInFlight => StatusCode::CONFLICT,
            AttendanceError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        match self {
            AttendanceError::OutsideZone { distance_m } => {
                body["distance_m"] = json!(distance_m);
            }
            AttendanceError::ReasonTooShort { min } => {
                body["min_chars"] = json!(min);
            }
            AttendanceError::Rejected(_) | AttendanceError::Unreachable { .. } => {
                body["status"] = json!("failed");
            }
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
