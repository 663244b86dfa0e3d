use crate::api::attendance::{CalendarResponse, HistoryQuery, MarkAttendanceRequest, MonthQuery};
use crate::api::leave_request::LeaveListResponse;
use crate::attendance::history::{CalendarDay, DailySummary, DayStatus};
use crate::attendance::workflow::{AttemptSnapshot, MarkOutcome};
use crate::model::attendance::{AttendanceLogEntry, AttendanceStatus, AttendanceType};
use crate::model::role::Role;
use crate::model::staff::StaffProfile;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Gateway API",
        version = "0.1.0",
        description = r#"
## Staff attendance gateway

Front door for the staff app. Staff sign in with their 4-digit PIN, which the
portal verifies; the gateway then runs the attendance workflow on their behalf.

### 🔹 Attendance
- **Punch In / Punch Out** need a GPS fix inside the store geofence and a
  verification snapshot.
- **Half Day / Leave** need a reason of at least 5 characters; no location.
- One submission at a time per session. A failed attempt can be
  acknowledged or simply retried.

### 🔐 Security
Protected endpoints take a **Bearer** token from `/auth/login`. Sessions end
after a period of inactivity.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::attendance_status,
        crate::api::attendance::acknowledge_failure,
        crate::api::attendance::attendance_history,
        crate::api::attendance::attendance_calendar,
        crate::api::attendance::attendance_today,

        crate::api::leave_request::leave_list
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            StaffProfile,
            Role,
            AttendanceType,
            AttendanceStatus,
            AttendanceLogEntry,
            MarkAttendanceRequest,
            MarkOutcome,
            AttemptSnapshot,
            HistoryQuery,
            MonthQuery,
            CalendarResponse,
            CalendarDay,
            DayStatus,
            DailySummary,
            LeaveListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "PIN sign-in"),
        (name = "Attendance", description = "Geofenced attendance marking and history"),
        (name = "Leave", description = "Leave records"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
