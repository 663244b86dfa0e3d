use crate::api::attendance::{HistoryQuery, resolve_range};
use crate::attendance::history;
use crate::auth::auth::AuthSession;
use crate::model::attendance::AttendanceLogEntry;
use crate::portal::Portal;
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "total_taken": 1,
    "data": [
        {
            "Type": "LEAVE",
            "Date": "07/01/2026",
            "Time": "08:00:00",
            "reason": "Family emergency"
        }
    ]
}))]
pub struct LeaveListResponse {
    /// Leave and half-day records in the range
    #[schema(example = 1)]
    pub total_taken: usize,
    pub data: Vec<AttendanceLogEntry>,
}

/* =========================
List own leave records
========================= */
/// Leave and half-day requests are filed through `POST /api/attendance`
/// with type LEAVE or HALF DAY; this lists what the portal recorded.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Leave records", body = LeaveListResponse),
        (status = 400, description = "Bad date range"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Portal unreachable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthSession,
    portal: web::Data<dyn Portal>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let range = resolve_range(&query, Local::now().date_naive())?;
    let entries = portal.attendance_log(&auth.pin, range).await?;
    let data = history::leave_records(&entries);

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        total_taken: data.len(),
        data,
    }))
}
