use crate::{
    api::{attendance, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let burst = requests_per_min.max(1);
        let per_ms = 60_000 / burst as u64;
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms.max(1))
            .burst_size(burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst are non-zero");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::post().to(attendance::mark_attendance)),
                    )
                    .service(
                        web::resource("/status")
                            .route(web::get().to(attendance::attendance_status)),
                    )
                    .service(
                        web::resource("/acknowledge")
                            .route(web::post().to(attendance::acknowledge_failure)),
                    )
                    .service(
                        web::resource("/history")
                            .route(web::get().to(attendance::attendance_history)),
                    )
                    .service(
                        web::resource("/calendar")
                            .route(web::get().to(attendance::attendance_calendar)),
                    )
                    .service(
                        web::resource("/today").route(web::get().to(attendance::attendance_today)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(web::resource("").route(web::get().to(leave_request::leave_list))),
            ),
    );
}

// LOGIN (4-digit PIN, verified by the portal)
//  └─ access_token  -> session { staff, pin, attendance workflow }

// API REQUEST
//  └─ Authorization: Bearer access_token

// IDLE (SESSION_IDLE_SECS without a request)
//  └─ session dropped, log in again
