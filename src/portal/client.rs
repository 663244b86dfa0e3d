use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{AttendanceSubmission, LogRange, Portal, PortalError, SessionPin};
use crate::model::attendance::AttendanceLogEntry;
use crate::model::staff::StaffProfile;

const PORTAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Shape shared by every portal action reply.
#[derive(Debug, Deserialize)]
struct ActionReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<StaffProfile>,
}

impl ActionReply {
    fn is_success(&self) -> bool {
        self.result.as_deref() == Some("success")
    }
}

#[derive(Debug, Deserialize)]
struct AttendanceLogReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    attendance: Option<Vec<AttendanceLogEntry>>,
}

/// HTTP client for the PHP portal. All actions go to a single endpoint:
/// writes as JSON POSTs carrying an `action` field, reads as GETs with query
/// parameters.
#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PortalError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn post_action(&self, body: &serde_json::Value) -> Result<ActionReply, PortalError> {
        let reply = self
            .http
            .post(&self.base_url)
            .json(body)
            .send()
            .await?
            .json::<ActionReply>()
            .await?;
        Ok(reply)
    }
}

#[async_trait]
impl Portal for PortalClient {
    #[instrument(name = "portal_login", skip_all)]
    async fn login(&self, pin: &SessionPin) -> Result<StaffProfile, PortalError> {
        let reply = self
            .post_action(&json!({ "action": "login", "pin": pin }))
            .await?;

        if !reply.is_success() {
            debug!("Portal refused login");
            return Err(PortalError::rejected(
                reply.message.or_else(|| Some("Login failed".to_string())),
            ));
        }

        reply
            .user
            .ok_or_else(|| PortalError::Malformed("login reply has no user".to_string()))
    }

    #[instrument(name = "portal_submit_attendance", skip_all, fields(kind = %submission.kind))]
    async fn submit_attendance(
        &self,
        submission: &AttendanceSubmission,
    ) -> Result<(), PortalError> {
        let reply = self
            .http
            .post(&self.base_url)
            .json(submission)
            .send()
            .await?
            .json::<ActionReply>()
            .await?;

        if reply.is_success() {
            Ok(())
        } else {
            warn!(message = ?reply.message, "Portal rejected attendance");
            Err(PortalError::rejected(reply.message))
        }
    }

    #[instrument(name = "portal_attendance_log", skip(self, pin), fields(start = %range.start, end = %range.end))]
    async fn attendance_log(
        &self,
        pin: &SessionPin,
        range: LogRange,
    ) -> Result<Vec<AttendanceLogEntry>, PortalError> {
        let query = [
            ("pin", pin.expose().to_string()),
            ("t", Utc::now().timestamp_millis().to_string()),
            ("action", "get_attendance".to_string()),
            ("start_date", range.start.format(PORTAL_DATE_FORMAT).to_string()),
            ("end_date", range.end.format(PORTAL_DATE_FORMAT).to_string()),
            ("limit", range.limit.to_string()),
        ];

        let reply = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?
            .json::<AttendanceLogReply>()
            .await?;

        match reply.attendance {
            Some(rows) => {
                debug!(rows = rows.len(), "Attendance log fetched");
                Ok(rows)
            }
            None if reply.result.as_deref() == Some("error") => {
                Err(PortalError::rejected(reply.message))
            }
            // no rows for the range
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceType;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    async fn fake_portal_post(body: web::Json<serde_json::Value>) -> HttpResponse {
        match body["action"].as_str() {
            Some("login") if body["pin"] == "1234" => HttpResponse::Ok().json(json!({
                "result": "success",
                "user": { "id": 42, "name": "Asha", "role": "admin", "pin": "1234" },
                "staffList": []
            })),
            Some("login") => HttpResponse::Ok().json(json!({
                "result": "error", "message": "Invalid PIN"
            })),
            Some("attendance") if body["type"] == "OUT" => HttpResponse::Ok().json(json!({
                "result": "error", "message": "Already marked"
            })),
            Some("attendance") => HttpResponse::Ok().json(json!({ "result": "success" })),
            _ => HttpResponse::Ok().json(json!({ "result": "error" })),
        }
    }

    async fn fake_portal_get(query: web::Query<HashMap<String, String>>) -> HttpResponse {
        if query.get("action").map(String::as_str) != Some("get_attendance")
            || query.get("start_date").map(String::as_str) != Some("2026-01-01")
            || query.get("pin").map(String::as_str) != Some("1234")
        {
            return HttpResponse::Ok().json(json!({ "result": "error", "message": "bad query" }));
        }
        HttpResponse::Ok().json(json!({
            "attendance": [
                { "Type": "IN", "Date": "02/01/2026", "Time": "09:55", "Name": "Asha" },
                { "Type": "LEAVE", "Date": "03/01/2026", "Time": "08:00", "reason": "Family emergency" }
            ]
        }))
    }

    async fn start_fake_portal() -> String {
        let server = HttpServer::new(|| {
            App::new().service(
                web::resource("/api/index.php")
                    .route(web::post().to(fake_portal_post))
                    .route(web::get().to(fake_portal_get)),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}/api/index.php")
    }

    fn client(url: String) -> PortalClient {
        PortalClient::new(url, Duration::from_secs(5)).unwrap()
    }

    fn pin() -> SessionPin {
        SessionPin::parse("1234").unwrap()
    }

    #[actix_web::test]
    async fn login_returns_profile_or_portal_message() {
        let portal = client(start_fake_portal().await);

        let staff = portal.login(&pin()).await.unwrap();
        assert_eq!(staff.id, "42");
        assert_eq!(staff.name, "Asha");

        let err = portal
            .login(&SessionPin::parse("9999").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid PIN");
    }

    #[actix_web::test]
    async fn submit_maps_result_field() {
        let portal = client(start_fake_portal().await);

        let ok = AttendanceSubmission::new(pin(), AttendanceType::In, "Face Verified".into(), None);
        portal.submit_attendance(&ok).await.unwrap();

        let dup = AttendanceSubmission::new(pin(), AttendanceType::Out, "Face Verified".into(), None);
        match portal.submit_attendance(&dup).await {
            Err(PortalError::Rejected(message)) => assert_eq!(message, "Already marked"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn attendance_log_sends_range_and_parses_rows() {
        let portal = client(start_fake_portal().await);
        let range = LogRange {
            start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            limit: 500,
        };

        let rows = portal.attendance_log(&pin(), range).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].attendance_type(), Some(AttendanceType::Leave));
        assert_eq!(rows[1].reason.as_deref(), Some("Family emergency"));
    }

    #[actix_web::test]
    async fn unreachable_portal_is_a_transport_error() {
        // nothing listens on the discard port
        let portal = client("http://127.0.0.1:9/api/index.php".to_string());
        let submission =
            AttendanceSubmission::new(pin(), AttendanceType::Leave, "Family emergency".into(), None);
        assert!(matches!(
            portal.submit_attendance(&submission).await,
            Err(PortalError::Transport(_))
        ));
    }
}
