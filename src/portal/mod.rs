use crate::{i18n::Catalog, identity::IdentityClient};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug_span, error, info};
use ulid::Ulid;

pub mod handlers;
pub mod views;

/// Build the portal router.
///
/// `/health` sits outside the request-id and trace layers.
pub fn router(identity: Arc<IdentityClient>, catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::activation::show).post(handlers::activation::submit),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(identity))
                .layer(Extension(catalog)),
        )
        .route("/health", get(handlers::health).options(handlers::health))
}

/// Serve the portal until Ctrl-C.
/// # Errors
/// Returns an error if the server fails to start
pub async fn new(port: u16, identity: Arc<IdentityClient>, catalog: Arc<Catalog>) -> Result<()> {
    info!(
        "Identity server: {}",
        identity.config().base_url.as_str()
    );

    let app = router(identity, catalog);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::{CHANGE_PASSWORD_PATH, IdentityConfig};
    use axum::{
        body::to_bytes,
        http::{StatusCode, header},
        response::Response,
    };
    use secrecy::SecretString;
    use serde_json::json;
    use std::net::TcpListener as StdTcpListener;
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_FORM: &str = "activationCode=ABCDEFGHIJ&oldPassword=OldPass1&newPassword=NewPass1&newPasswordConfirmation=NewPass1";

    fn can_bind_localhost() -> bool {
        StdTcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn app(identity_url: &str) -> Router {
        let config = IdentityConfig::new(
            Url::parse(identity_url).unwrap(),
            SecretString::from("test-api-key".to_string()),
        );
        router(
            Arc::new(IdentityClient::new(config).unwrap()),
            Arc::new(Catalog::default()),
        )
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn expect_no_identity_calls(server: &MockServer) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn get_shows_form_with_code_from_query() {
        let response = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .uri("/?code=ABCDEFGHIJ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let html = body_text(response).await;
        assert!(html.contains(r#"name="activationCode""#));
        assert!(html.contains(r#"value="ABCDEFGHIJ""#));
    }

    #[tokio::test]
    async fn get_without_code_shows_empty_form() {
        let response = app("http://127.0.0.1:9")
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"<form method="post""#));
        assert!(!html.contains(r#"class="field-error""#));
    }

    #[tokio::test]
    async fn same_password_is_not_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        expect_no_identity_calls(&server).await;

        let response = app(&server.uri())
            .oneshot(post_form(
                "activationCode=ABCDEFGHIJ&oldPassword=OldPass1&newPassword=OldPass1&newPasswordConfirmation=OldPass1",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        let messages = Catalog::default().validation_message;
        assert!(html.contains(&messages.new_password_must_be_different_from_old_password));
        assert!(html.contains(r#"value="ABCDEFGHIJ""#));
        assert!(!html.contains("OldPass1"));
    }

    #[tokio::test]
    async fn confirmation_mismatch_is_not_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        expect_no_identity_calls(&server).await;

        let response = app(&server.uri())
            .oneshot(post_form(
                "activationCode=ABCDEFGHIJ&oldPassword=OldPass1&newPassword=NewPass1&newPasswordConfirmation=NewPass2",
            ))
            .await
            .unwrap();

        let html = body_text(response).await;
        let messages = Catalog::default().validation_message;
        assert!(html.contains(&messages.password_confirmation_does_not_match_password));
    }

    #[tokio::test]
    async fn short_code_is_not_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        expect_no_identity_calls(&server).await;

        let response = app(&server.uri())
            .oneshot(post_form(
                "activationCode=ABC&oldPassword=OldPass1&newPassword=NewPass1&newPasswordConfirmation=NewPass1",
            ))
            .await
            .unwrap();

        let html = body_text(response).await;
        let messages = Catalog::default().validation_message;
        assert!(html.contains(&messages.activation_code));
    }

    #[tokio::test]
    async fn empty_body_flags_required_fields() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_form(""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        let messages = Catalog::default().validation_message;
        assert!(html.contains(&messages.activation_code));
        assert!(html.contains(&messages.password));
        assert!(!html.contains(&messages.email));
        assert!(!html.contains(&messages.phone_number));
    }

    #[tokio::test]
    async fn valid_submission_shows_success() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHANGE_PASSWORD_PATH))
            .and(body_json(json!({
                "mode": "activationCode",
                "value": "ABCDEFGHIJ",
                "oldPassword": "OldPass1",
                "newPassword": "NewPass1"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "authorized" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        let messages = Catalog::default().messages;
        assert!(html.contains(&messages.activate_login_success_title));
        assert!(html.contains(&messages.activate_login_success_message));
        assert!(!html.contains("<form"));
    }

    #[tokio::test]
    async fn valid_submission_with_optional_fields_is_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHANGE_PASSWORD_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let body = format!("{VALID_FORM}&email=citizen%40example.pt&phoneNumber=%2B351912345678");
        let response = app(&server.uri())
            .oneshot(post_form(&body))
            .await
            .unwrap();

        let html = body_text(response).await;
        assert!(html.contains(&Catalog::default().messages.activate_login_success_title));
    }

    #[tokio::test]
    async fn rejection_message_is_shown_on_form() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHANGE_PASSWORD_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "code expired" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("code expired"));
        assert!(html.contains(r#"class="alert""#));
        assert!(html.contains(r#"value="ABCDEFGHIJ""#));
        assert!(!html.contains("NewPass1"));
    }

    #[tokio::test]
    async fn unreachable_identity_server_is_shown_on_form() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        // free port with nothing listening
        let port = StdTcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let response = app(&format!("http://127.0.0.1:{port}"))
            .oneshot(post_form(VALID_FORM))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"value="ABCDEFGHIJ""#));
        assert!(html.contains(r#"<div class="alert" role="alert">error sending request"#));
        assert!(html.contains(CHANGE_PASSWORD_PATH));
        assert!(!html.contains("NewPass1"));
    }

    #[tokio::test]
    async fn email_without_tld_is_not_sent() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        expect_no_identity_calls(&server).await;

        let body = format!("{VALID_FORM}&email=citizen%40localhost");
        let response = app(&server.uri())
            .oneshot(post_form(&body))
            .await
            .unwrap();

        let html = body_text(response).await;
        assert!(html.contains(&Catalog::default().validation_message.email));
        assert!(html.contains(r#"value="citizen@localhost""#));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app("http://127.0.0.1:9")
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    }
}
