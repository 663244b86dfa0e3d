//! The remote staff portal: PIN login, attendance recording and the
//! attendance log. Everything the gateway knows about staff comes from here.

pub mod client;
#[cfg(test)]
pub mod fake;

use actix_web::{HttpResponse, http::StatusCode};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::model::attendance::{AttendanceLogEntry, AttendanceType, CapturedImage};
use crate::model::staff::StaffProfile;

pub use client::PortalClient;

/// Message shown when the portal gives no usable reason for a failure.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Marking failed";

#[derive(Debug, Error)]
pub enum PortalError {
    /// The portal answered with `result != "success"`.
    #[error("{0}")]
    Rejected(String),

    #[error("portal unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected portal reply: {0}")]
    Malformed(String),
}

impl PortalError {
    pub fn rejected(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => PortalError::Rejected(m),
            _ => PortalError::Rejected(FALLBACK_FAILURE_MESSAGE.to_string()),
        }
    }
}

impl actix_web::ResponseError for PortalError {
    fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            PortalError::Rejected(message) => message.as_str(),
            _ => "Portal unavailable",
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}

/// The staff PIN. The portal uses it both as the login credential and as a
/// bearer on every later call, so it is handed to whoever needs it instead of
/// living in shared state.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionPin(String);

impl SessionPin {
    pub const LEN: usize = 4;

    /// Accepts exactly four ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionPin(****)")
    }
}

impl Serialize for SessionPin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Body of the portal's `attendance` action.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSubmission {
    pub action: &'static str,
    pub pin: SessionPin,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CapturedImage>,
}

impl AttendanceSubmission {
    pub fn new(
        pin: SessionPin,
        kind: AttendanceType,
        reason: String,
        image: Option<CapturedImage>,
    ) -> Self {
        Self {
            action: "attendance",
            pin,
            kind,
            reason,
            image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub limit: u32,
}

#[async_trait]
pub trait Portal: Send + Sync {
    async fn login(&self, pin: &SessionPin) -> Result<StaffProfile, PortalError>;

    async fn submit_attendance(&self, submission: &AttendanceSubmission)
    -> Result<(), PortalError>;

    async fn attendance_log(
        &self,
        pin: &SessionPin,
        range: LogRange,
    ) -> Result<Vec<AttendanceLogEntry>, PortalError>;
}
