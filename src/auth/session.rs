use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;

use crate::attendance::AttendanceWorkflow;
use crate::model::role::Role;
use crate::model::staff::StaffProfile;
use crate::portal::SessionPin;

const MAX_SESSIONS: u64 = 10_000;

/// A signed-in staff member. Owns the PIN and the attendance workflow for
/// the lifetime of the login.
pub struct Session {
    pub jti: String,
    pub staff: StaffProfile,
    pub role: Role,
    pub pin: SessionPin,
    pub workflow: AttendanceWorkflow,
}

/// Live sessions keyed by token `jti`. Entries expire after a period of
/// inactivity, which logs the staff member out.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<Session>>,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .eviction_listener(|jti, _session, cause| {
                if cause == RemovalCause::Expired {
                    log::info!("Session {} expired due to inactivity", jti);
                }
            })
            .build();
        Self { sessions }
    }

    pub async fn open(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions
            .insert(session.jti.clone(), session.clone())
            .await;
        session
    }

    /// Looks the session up and counts as activity.
    pub async fn get(&self, jti: &str) -> Option<Arc<Session>> {
        self.sessions.get(jti).await
    }

    pub async fn close(&self, jti: &str) -> bool {
        self.sessions.remove(jti).await.is_some()
    }
}
