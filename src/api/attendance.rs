use crate::attendance::history::{self, CalendarDay};
use crate::attendance::providers::{ReportedPosition, UploadedPhoto};
use crate::auth::auth::AuthSession;
use crate::model::attendance::AttendanceType;
use crate::portal::{LogRange, Portal};
use actix_web::{HttpResponse, Responder, error::ErrorBadRequest, web};
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_HISTORY_DAYS: u64 = 90;
pub const DEFAULT_HISTORY_LIMIT: u32 = 500;
pub const MAX_HISTORY_LIMIT: u32 = 50_000;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    #[serde(rename = "type")]
    #[schema(example = "IN")]
    pub kind: AttendanceType,
    /// Device GPS fix. Required for IN/OUT.
    #[schema(example = 26.899, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 75.739, nullable = true)]
    pub longitude: Option<f64>,
    /// Set when the user refused location access.
    #[serde(default)]
    pub gps_denied: bool,
    /// Verification snapshot (data URL). Required for IN/OUT.
    #[schema(nullable = true)]
    pub image: Option<String>,
    /// Required for HALF DAY and LEAVE, min 5 characters.
    #[schema(example = "Family emergency", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// First day, YYYY-MM-DD (default: 90 days ago)
    #[schema(example = "2026-01-01")]
    pub start_date: Option<String>,
    /// Last day, YYYY-MM-DD (default: today)
    #[schema(example = "2026-01-31")]
    pub end_date: Option<String>,
    /// Max rows (default 500)
    #[schema(example = 500)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// YYYY-MM (default: current month)
    #[schema(example = "2026-01")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarResponse {
    #[schema(example = "2026-01")]
    pub month: String,
    pub days: Vec<CalendarDay>,
}

fn parse_day(field: &str, raw: &str) -> actix_web::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ErrorBadRequest(format!("{field} must be YYYY-MM-DD")))
}

/// Resolves a history query against `today`.
pub(crate) fn resolve_range(query: &HistoryQuery, today: NaiveDate) -> actix_web::Result<LogRange> {
    let end = match &query.end_date {
        Some(raw) => parse_day("end_date", raw)?,
        None => today,
    };
    let start = match &query.start_date {
        Some(raw) => parse_day("start_date", raw)?,
        None => end
            .checked_sub_days(Days::new(DEFAULT_HISTORY_DAYS))
            .unwrap_or(NaiveDate::MIN),
    };
    if start > end {
        return Err(ErrorBadRequest("start_date cannot be after end_date"));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(LogRange { start, end, limit })
}

fn parse_month(raw: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = raw.trim().split_once('-')?;
    history::month_bounds(year.parse().ok()?, month.parse().ok()?)
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(
        content = MarkAttendanceRequest,
        description = "Attendance action with the device's GPS fix and snapshot",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Attendance marked", body = MarkOutcome),
        (status = 400, description = "Precondition failed, nothing submitted", body = Object, example = json!({
            "code": "outside_zone",
            "message": "Outside Zone: 1112m away.",
            "distance_m": 1112
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A submission is already in progress"),
        (status = 422, description = "Portal rejected the submission", body = Object, example = json!({
            "code": "rejected",
            "message": "Already marked",
            "status": "failed"
        })),
        (status = 502, description = "Portal unreachable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "attendance_request",
    skip(auth, payload),
    fields(staff_id = %auth.staff.id, kind = %payload.kind)
)]
pub async fn mark_attendance(
    auth: AuthSession,
    payload: web::Json<MarkAttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let location = ReportedPosition::new(payload.latitude, payload.longitude, payload.gps_denied);
    let photo = UploadedPhoto::new(payload.image);

    let outcome = auth
        .workflow
        .mark(payload.kind, &location, &photo, payload.reason.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Current attempt status
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Status of the latest attempt", body = AttemptSnapshot),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_status(auth: AuthSession) -> impl Responder {
    HttpResponse::Ok().json(auth.workflow.snapshot())
}

/// Dismiss a failed attempt
#[utoipa::path(
    post,
    path = "/api/attendance/acknowledge",
    responses(
        (status = 200, description = "Attempt status after acknowledging", body = AttemptSnapshot),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn acknowledge_failure(auth: AuthSession) -> impl Responder {
    HttpResponse::Ok().json(auth.workflow.acknowledge())
}

/// Own attendance log
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance log entries", body = [AttendanceLogEntry]),
        (status = 400, description = "Bad date range"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Portal unreachable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_history(
    auth: AuthSession,
    portal: web::Data<dyn Portal>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let range = resolve_range(&query, Local::now().date_naive())?;
    let entries = portal.attendance_log(&auth.pin, range).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Month calendar
#[utoipa::path(
    get,
    path = "/api/attendance/calendar",
    params(MonthQuery),
    responses(
        (status = 200, description = "Per-day status for the month", body = CalendarResponse),
        (status = 400, description = "Bad month"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_calendar(
    auth: AuthSession,
    portal: web::Data<dyn Portal>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let (first, last) = match &query.month {
        Some(raw) => parse_month(raw).ok_or_else(|| ErrorBadRequest("month must be YYYY-MM"))?,
        None => {
            let today = Local::now().date_naive();
            history::month_bounds(today.year(), today.month())
                .ok_or_else(|| ErrorBadRequest("month out of range"))?
        }
    };

    let range = LogRange {
        start: first,
        end: last,
        limit: MAX_HISTORY_LIMIT,
    };
    let entries = portal.attendance_log(&auth.pin, range).await?;

    Ok(HttpResponse::Ok().json(CalendarResponse {
        month: first.format("%Y-%m").to_string(),
        days: history::month_calendar(&entries, first),
    }))
}

/// Today's headcount (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Distinct staff present and on leave today", body = DailySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_today(
    auth: AuthSession,
    portal: web::Data<dyn Portal>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Local::now().date_naive();
    let range = LogRange {
        start: today,
        end: today,
        limit: MAX_HISTORY_LIMIT,
    };
    let entries = portal.attendance_log(&auth.pin, range).await?;

    Ok(HttpResponse::Ok().json(history::daily_summary(&entries, today)))
}
