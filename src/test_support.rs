//! Helpers for handler tests: a full app wired to a `FakePortal`.

use std::net::SocketAddr;

/// Governor keys on the peer address, so test requests need one.
pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

macro_rules! test_app {
    ($portal:expr) => {{
        let portal: std::sync::Arc<crate::portal::fake::FakePortal> = $portal;
        let config = crate::config::Config::for_tests();
        let sessions = crate::auth::session::SessionStore::new(config.session_idle);
        let portal: std::sync::Arc<dyn crate::portal::Portal> = portal;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(actix_web::web::Data::new(sessions))
                .app_data(actix_web::web::Data::from(portal))
                .configure(|cfg| crate::routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

/// Signs in through `/auth/login` and yields the Authorization header value.
macro_rules! login_bearer {
    ($app:expr, $pin:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr(crate::test_support::peer())
            .set_json(serde_json::json!({ "pin": $pin }))
            .to_request();
        let body: serde_json::Value = actix_web::test::call_and_read_body_json($app, req).await;
        format!(
            "Bearer {}",
            body["access_token"].as_str().expect("login should succeed")
        )
    }};
}

pub(crate) use {login_bearer, test_app};
