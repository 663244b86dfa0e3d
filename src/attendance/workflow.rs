use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use actix_web::rt::time::timeout;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::error::AttendanceError;
use super::providers::{LocationError, LocationProvider, PhotoCapture};
use crate::geo::Geofence;
use crate::model::attendance::{AttendanceAttempt, AttendanceStatus, AttendanceType, CapturedImage};
use crate::portal::{AttendanceSubmission, Portal, PortalError, SessionPin};

pub const MIN_REASON_CHARS: usize = 5;

/// Reason the portal records for photo-verified punches.
pub const PRESENCE_REASON: &str = "Face Verified";

pub const SUCCESS_REDIRECT: &str = "/dashboard";

#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    pub geofence: Geofence,
    pub min_reason_chars: usize,
    pub location_timeout: Duration,
    pub submit_timeout: Duration,
    /// How long the success state is shown before moving on.
    pub success_display: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            geofence: Geofence::default(),
            min_reason_chars: MIN_REASON_CHARS,
            location_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(15),
            success_display: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MarkOutcome {
    pub status: AttendanceStatus,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[schema(example = "IN marked!")]
    pub message: String,
    #[schema(example = "/dashboard")]
    pub redirect_to: String,
    #[schema(example = 2000)]
    pub redirect_after_ms: u64,
    /// Distance from the store, for punches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttemptSnapshot {
    pub status: AttendanceStatus,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttendanceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&AttendanceAttempt> for AttemptSnapshot {
    fn from(attempt: &AttendanceAttempt) -> Self {
        Self {
            status: attempt.status,
            kind: attempt.kind,
            message: attempt.message.clone(),
        }
    }
}

/// What gating produced for the submission.
enum Evidence {
    Presence {
        image: CapturedImage,
        distance_m: f64,
    },
    Reason(String),
}

/// Attendance marking for one signed-in staff member.
///
/// The session PIN is handed in at construction and forwarded with every
/// submission. At most one submission is in flight at a time; a second one
/// is refused while the first is VERIFYING.
pub struct AttendanceWorkflow {
    settings: WorkflowSettings,
    pin: SessionPin,
    portal: Arc<dyn Portal>,
    attempt: Mutex<AttendanceAttempt>,
}

impl AttendanceWorkflow {
    pub fn new(settings: WorkflowSettings, pin: SessionPin, portal: Arc<dyn Portal>) -> Self {
        Self {
            settings,
            pin,
            portal,
            attempt: Mutex::new(AttendanceAttempt::default()),
        }
    }

    // Never held across an await.
    fn attempt(&self) -> MutexGuard<'_, AttendanceAttempt> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> AttemptSnapshot {
        AttemptSnapshot::from(&*self.attempt())
    }

    /// FAILED -> PENDING after the user has seen the error. A no-op in any
    /// other state.
    pub fn acknowledge(&self) -> AttemptSnapshot {
        let mut attempt = self.attempt();
        if attempt.acknowledge() {
            debug!("Failed attempt acknowledged");
        }
        AttemptSnapshot::from(&*attempt)
    }

    /// Raw character count, no trimming.
    pub fn check_reason(&self, reason: Option<&str>) -> Result<String, AttendanceError> {
        let min = self.settings.min_reason_chars;
        match reason {
            Some(r) if r.chars().count() >= min => Ok(r.to_string()),
            _ => Err(AttendanceError::ReasonTooShort { min }),
        }
    }

    /// Location first, then the geofence. Returns the distance to the store.
    pub async fn check_presence(
        &self,
        location: &dyn LocationProvider,
    ) -> Result<f64, AttendanceError> {
        let position = match timeout(self.settings.location_timeout, location.current_position())
            .await
        {
            Ok(Ok(position)) => position,
            Ok(Err(LocationError::AccessRequired)) => {
                return Err(AttendanceError::LocationAccessRequired);
            }
            Ok(Err(LocationError::Unavailable)) | Err(_) => {
                return Err(AttendanceError::WaitingForLocation);
            }
        };

        self.settings.geofence.check(position).map_err(|distance| {
            info!(distance_m = distance.round(), "Punch outside geofence");
            AttendanceError::OutsideZone {
                distance_m: distance.round() as u64,
            }
        })
    }

    async fn gate(
        &self,
        kind: AttendanceType,
        location: &dyn LocationProvider,
        photo: &dyn PhotoCapture,
        reason: Option<&str>,
    ) -> Result<Evidence, AttendanceError> {
        if kind.requires_presence() {
            let distance_m = self.check_presence(location).await?;
            let image = photo.capture().await.ok_or(AttendanceError::PhotoRequired)?;
            Ok(Evidence::Presence { image, distance_m })
        } else {
            self.check_reason(reason).map(Evidence::Reason)
        }
    }

    /// Replaces whatever the previous attempt left behind and moves the new
    /// one to VERIFYING.
    fn begin(
        &self,
        kind: AttendanceType,
        reason: &str,
        image: Option<CapturedImage>,
    ) -> Result<InFlight<'_>, AttendanceError> {
        let mut attempt = self.attempt();
        if attempt.is_verifying() {
            return Err(AttendanceError::SubmissionInFlight);
        }
        *attempt = AttendanceAttempt::new(kind, Some(reason.to_string()), image);
        attempt.begin_verifying();
        Ok(InFlight {
            workflow: self,
            settled: false,
        })
    }

    /// Runs one attempt: gate, submit, settle.
    ///
    /// Precondition failures return before anything is sent and leave the
    /// current attempt alone. Once submission starts the attempt ends in
    /// SUCCESS or FAILED; if this future is dropped first the attempt goes
    /// back to PENDING and the late reply is discarded.
    #[instrument(name = "attendance_mark", skip(self, location, photo, reason), fields(kind = %kind))]
    pub async fn mark(
        &self,
        kind: AttendanceType,
        location: &dyn LocationProvider,
        photo: &dyn PhotoCapture,
        reason: Option<&str>,
    ) -> Result<MarkOutcome, AttendanceError> {
        if self.attempt().is_verifying() {
            return Err(AttendanceError::SubmissionInFlight);
        }

        let (reason, image, distance_m) = match self.gate(kind, location, photo, reason).await? {
            Evidence::Presence { image, distance_m } => {
                (PRESENCE_REASON.to_string(), Some(image), Some(distance_m))
            }
            Evidence::Reason(reason) => (reason, None, None),
        };

        let in_flight = self.begin(kind, &reason, image.clone())?;
        info!("Attendance submission started");

        let submission = AttendanceSubmission::new(self.pin.clone(), kind, reason, image);
        let reply = timeout(
            self.settings.submit_timeout,
            self.portal.submit_attendance(&submission),
        )
        .await;

        let result = match reply {
            Ok(Ok(())) => Ok(()),
            Ok(Err(PortalError::Rejected(message))) => Err(AttendanceError::Rejected(message)),
            Ok(Err(e)) => Err(AttendanceError::Unreachable {
                detail: e.to_string(),
            }),
            Err(_) => Err(AttendanceError::Unreachable {
                detail: format!(
                    "no reply within {}s",
                    self.settings.submit_timeout.as_secs_f32()
                ),
            }),
        };

        match result {
            Ok(()) => {
                let message = format!("{kind} marked!");
                in_flight.settle(|attempt| {
                    attempt.succeed(message.clone());
                });
                info!("Attendance marked");
                Ok(MarkOutcome {
                    status: AttendanceStatus::Success,
                    kind,
                    message,
                    redirect_to: SUCCESS_REDIRECT.to_string(),
                    redirect_after_ms: self.settings.success_display.as_millis() as u64,
                    distance_m,
                })
            }
            Err(err) => {
                if let AttendanceError::Unreachable { detail } = &err {
                    warn!(%detail, "Attendance submission failed");
                } else {
                    warn!(message = %err, "Attendance submission rejected");
                }
                let message = err.to_string();
                in_flight.settle(|attempt| {
                    attempt.fail(message);
                });
                Err(err)
            }
        }
    }
}

/// Marks the attempt as VERIFYING for as long as it lives. Dropping it
/// unsettled puts the attempt back to PENDING.
struct InFlight<'a> {
    workflow: &'a AttendanceWorkflow,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, f: impl FnOnce(&mut AttendanceAttempt)) {
        f(&mut self.workflow.attempt());
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut attempt = self.workflow.attempt();
        if attempt.is_verifying() {
            debug!("Submission abandoned, attempt reset");
            *attempt = AttendanceAttempt::default();
        }
    }
}
