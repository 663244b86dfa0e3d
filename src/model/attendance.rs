use std::sync::Arc;

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// Date format the portal uses in attendance logs.
pub const LOG_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
    EnumString,
    AsRefStr,
)]
pub enum AttendanceType {
    #[serde(rename = "IN")]
    #[strum(to_string = "IN")]
    In,
    #[serde(rename = "OUT")]
    #[strum(to_string = "OUT")]
    Out,
    #[serde(rename = "HALF DAY", alias = "HALF_DAY")]
    #[strum(to_string = "HALF DAY", serialize = "HALF_DAY")]
    HalfDay,
    #[serde(rename = "LEAVE")]
    #[strum(to_string = "LEAVE")]
    Leave,
}

impl AttendanceType {
    /// Punch in/out must happen inside the geofence with photo evidence.
    pub fn requires_presence(self) -> bool {
        matches!(self, AttendanceType::In | AttendanceType::Out)
    }

    /// Half days and leave are permission requests and need a reason.
    pub fn requires_reason(self) -> bool {
        matches!(self, AttendanceType::HalfDay | AttendanceType::Leave)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    #[display(fmt = "pending")]
    Pending,
    #[display(fmt = "verifying")]
    Verifying,
    #[display(fmt = "success")]
    Success,
    #[display(fmt = "failed")]
    Failed,
}

/// Opaque verification snapshot (data URL or base64) as produced by the
/// device camera. Never inspected, only forwarded. Clones share the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage(Arc<str>);

impl CapturedImage {
    pub fn new(data: String) -> Self {
        Self(Arc::from(data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for CapturedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CapturedImage({} bytes)", self.0.len())
    }
}

/// One user-initiated marking attempt.
#[derive(Debug, Clone, Default)]
pub struct AttendanceAttempt {
    pub kind: Option<AttendanceType>,
    pub reason: Option<String>,
    pub captured_image: Option<CapturedImage>,
    pub status: AttendanceStatus,
    pub message: Option<String>,
}

impl AttendanceAttempt {
    pub fn new(
        kind: AttendanceType,
        reason: Option<String>,
        captured_image: Option<CapturedImage>,
    ) -> Self {
        Self {
            kind: Some(kind),
            reason,
            captured_image,
            status: AttendanceStatus::Pending,
            message: None,
        }
    }

    pub fn is_verifying(&self) -> bool {
        self.status == AttendanceStatus::Verifying
    }

    /// PENDING -> VERIFYING. Returns false for any other starting state.
    pub fn begin_verifying(&mut self) -> bool {
        if self.status != AttendanceStatus::Pending {
            return false;
        }
        self.status = AttendanceStatus::Verifying;
        true
    }

    /// VERIFYING -> SUCCESS. The image is released once settled.
    pub fn succeed(&mut self, message: String) -> bool {
        self.settle(AttendanceStatus::Success, message)
    }

    /// VERIFYING -> FAILED
    pub fn fail(&mut self, message: String) -> bool {
        self.settle(AttendanceStatus::Failed, message)
    }

    fn settle(&mut self, status: AttendanceStatus, message: String) -> bool {
        if !self.is_verifying() {
            return false;
        }
        self.status = status;
        self.message = Some(message);
        self.captured_image = None;
        true
    }

    /// FAILED -> PENDING once the user has seen the error. Drops everything
    /// the failed attempt carried.
    pub fn acknowledge(&mut self) -> bool {
        if self.status != AttendanceStatus::Failed {
            return false;
        }
        *self = Self::default();
        true
    }
}

/// Attendance record as returned by the portal. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceLogEntry {
    #[serde(rename = "Type")]
    #[schema(example = "IN")]
    pub kind: String,

    #[serde(rename = "Date")]
    #[schema(example = "15/01/2026")]
    pub date: String,

    #[serde(rename = "Time", default)]
    #[schema(example = "09:58:12", nullable = true)]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AttendanceLogEntry {
    pub fn attendance_type(&self) -> Option<AttendanceType> {
        self.kind.trim().parse().ok()
    }

    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), LOG_DATE_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_uses_portal_spelling() {
        assert_eq!(AttendanceType::HalfDay.to_string(), "HALF DAY");
        assert_eq!(AttendanceType::In.as_ref(), "IN");
        assert_eq!("HALF_DAY".parse::<AttendanceType>(), Ok(AttendanceType::HalfDay));
        assert_eq!("HALF DAY".parse::<AttendanceType>(), Ok(AttendanceType::HalfDay));
        assert!("LUNCH".parse::<AttendanceType>().is_err());

        let json = serde_json::to_string(&AttendanceType::HalfDay).unwrap();
        assert_eq!(json, "\"HALF DAY\"");
        let parsed: AttendanceType = serde_json::from_str("\"HALF_DAY\"").unwrap();
        assert_eq!(parsed, AttendanceType::HalfDay);
    }

    #[test]
    fn status_machine_follows_happy_path() {
        let mut attempt = AttendanceAttempt::new(AttendanceType::In, None, None);
        assert_eq!(attempt.status, AttendanceStatus::Pending);
        assert!(!attempt.succeed("too early".into()));
        assert!(attempt.begin_verifying());
        assert!(!attempt.begin_verifying());
        assert!(attempt.succeed("IN marked!".into()));
        assert_eq!(attempt.status, AttendanceStatus::Success);
        assert!(!attempt.acknowledge());
    }

    #[test]
    fn settling_releases_the_snapshot() {
        let image = CapturedImage::new("data:image/jpeg;base64,/9j/4AAQ".into());
        for succeed in [true, false] {
            let mut attempt = AttendanceAttempt::new(AttendanceType::Out, None, Some(image.clone()));
            attempt.begin_verifying();
            assert!(attempt.captured_image.is_some());

            let settled = if succeed {
                attempt.succeed("OUT marked!".into())
            } else {
                attempt.fail("Marking failed".into())
            };
            assert!(settled);
            assert!(attempt.captured_image.is_none());
            assert_eq!(attempt.kind, Some(AttendanceType::Out));
        }
    }

    #[test]
    fn snapshot_serializes_as_plain_string() {
        let image = CapturedImage::new("data:image/png;base64,iVBOR".into());
        assert_eq!(
            serde_json::to_value(&image).unwrap(),
            serde_json::json!("data:image/png;base64,iVBOR")
        );
        assert_eq!(format!("{image:?}"), "CapturedImage(27 bytes)");
    }

    #[test]
    fn acknowledged_failure_leaves_no_residue() {
        let mut attempt = AttendanceAttempt::new(
            AttendanceType::Leave,
            Some("Family emergency".into()),
            None,
        );
        attempt.begin_verifying();
        assert!(attempt.fail("Already marked".into()));
        assert_eq!(attempt.status.to_string(), "failed");
        assert_eq!(attempt.message.as_deref(), Some("Already marked"));

        assert!(attempt.acknowledge());
        assert_eq!(attempt.status, AttendanceStatus::Pending);
        assert!(attempt.kind.is_none());
        assert!(attempt.reason.is_none());
        assert!(attempt.message.is_none());
    }

    #[test]
    fn log_entry_reads_portal_row() {
        let row = r#"{"Type":"HALF DAY","Date":"03/02/2026","Time":"13:05","reason":"Doctor visit","Name":"Asha"}"#;
        let entry: AttendanceLogEntry = serde_json::from_str(row).unwrap();
        assert_eq!(entry.attendance_type(), Some(AttendanceType::HalfDay));
        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2026, 2, 3));
        assert_eq!(entry.name.as_deref(), Some("Asha"));

        let bare: AttendanceLogEntry =
            serde_json::from_str(r#"{"Type":"IN","Date":"garbage"}"#).unwrap();
        assert!(bare.time.is_none());
        assert!(bare.day().is_none());
    }
}
