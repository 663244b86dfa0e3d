use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{AttendanceSubmission, LogRange, Portal, PortalError, SessionPin};
use crate::model::attendance::AttendanceLogEntry;
use crate::model::staff::StaffProfile;

/// In-process portal. Submissions succeed unless a scripted reply is queued.
#[derive(Default)]
pub struct FakePortal {
    pub submit_replies: Mutex<VecDeque<Result<(), PortalError>>>,
    pub submissions: Mutex<Vec<AttendanceSubmission>>,
    pub submit_calls: AtomicUsize,
    pub submit_delay: Option<Duration>,
    pub staff: Mutex<Vec<(String, StaffProfile)>>,
    pub log: Mutex<Vec<AttendanceLogEntry>>,
}

impl FakePortal {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            submit_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: Result<(), PortalError>) {
        self.submit_replies.lock().unwrap().push_back(reply);
    }

    pub fn add_staff(&self, pin: &str, id: &str, name: &str, role: &str) {
        self.staff.lock().unwrap().push((
            pin.to_string(),
            StaffProfile {
                id: id.to_string(),
                name: name.to_string(),
                role: Some(role.to_string()),
                designation: None,
            },
        ));
    }

    pub fn add_log(&self, kind: &str, date: &str, name: &str) {
        self.log.lock().unwrap().push(AttendanceLogEntry {
            kind: kind.to_string(),
            date: date.to_string(),
            time: Some("10:00".to_string()),
            reason: None,
            name: Some(name.to_string()),
        });
    }

    pub fn calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Portal for FakePortal {
    async fn login(&self, pin: &SessionPin) -> Result<StaffProfile, PortalError> {
        self.staff
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == pin.expose())
            .map(|(_, staff)| staff.clone())
            .ok_or_else(|| PortalError::Rejected("Invalid PIN".to_string()))
    }

    async fn submit_attendance(
        &self,
        submission: &AttendanceSubmission,
    ) -> Result<(), PortalError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.submit_delay {
            actix_web::rt::time::sleep(delay).await;
        }
        self.submissions.lock().unwrap().push(submission.clone());
        self.submit_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn attendance_log(
        &self,
        _pin: &SessionPin,
        range: LogRange,
    ) -> Result<Vec<AttendanceLogEntry>, PortalError> {
        Ok(self
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.day().is_some_and(|d| d >= range.start && d <= range.end))
            .take(range.limit as usize)
            .cloned()
            .collect())
    }
}
