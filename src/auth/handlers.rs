use crate::{
    attendance::AttendanceWorkflow,
    auth::{
        jwt::{generate_access_token, verify_token},
        session::{Session, SessionStore},
    },
    config::Config,
    models::{LoginReqDto, LoginResponse},
    portal::{Portal, PortalError, SessionPin},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// PIN login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "PIN is not four digits", body = Object, example = json!({
            "error": "PIN must be 4 digits"
        })),
        (status = 401, description = "Portal refused the PIN", body = Object, example = json!({
            "error": "Invalid PIN"
        })),
        (status = 502, description = "Portal unreachable")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(user, portal, sessions, config))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    portal: web::Data<dyn Portal>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    let Some(pin) = SessionPin::parse(user.pin.trim()) else {
        info!("Validation failed: malformed PIN");
        return HttpResponse::BadRequest().json(json!({
            "error": "PIN must be 4 digits"
        }));
    };

    // 2️⃣ Portal verifies the PIN
    let staff = match portal.login(&pin).await {
        Ok(staff) => {
            debug!(staff_id = %staff.id, "Portal accepted PIN");
            staff
        }
        Err(PortalError::Rejected(message)) => {
            info!("Invalid credentials");
            return HttpResponse::Unauthorized().json(json!({ "error": message }));
        }
        Err(e) => {
            error!(error = %e, "Portal login failed");
            return HttpResponse::BadGateway().json(json!({
                "error": "Portal unavailable"
            }));
        }
    };

    // 3️⃣ Issue token
    let jti = Uuid::new_v4().to_string();
    let access_token = match generate_access_token(
        &staff,
        &jti,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 4️⃣ Open session; the workflow gets the PIN directly
    let role = staff.role();
    let workflow = AttendanceWorkflow::new(
        config.workflow_settings(),
        pin.clone(),
        portal.into_inner(),
    );
    sessions
        .open(Session {
            jti,
            staff: staff.clone(),
            role,
            pin,
            workflow,
        })
        .await;

    info!(staff_id = %staff.id, ?role, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        role,
        staff,
    })
}

/// Ends the session behind the bearer token. Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Signed out (idempotent)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> impl Responder {
    // 1️⃣ extract Authorization header
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    // 2️⃣ verify JWT
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Logout with unusable token");
            return HttpResponse::NoContent().finish();
        }
    };

    // 3️⃣ drop session (idempotent)
    if sessions.close(&claims.jti).await {
        info!(staff_id = %claims.sub, "Logged out");
    }

    HttpResponse::NoContent().finish()
}
