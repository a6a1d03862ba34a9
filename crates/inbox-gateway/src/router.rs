//! HTTP routes: decode requests, call [`InboxHandlers`], encode responses.

use crate::domain::config::GatewayConfig;
use crate::domain::error::{InboxError, InboxResult};
use crate::domain::types::{
    ArtifactMetadata, DownloadRequest, UploadForm, UploadResponse, UploadedImage,
    VerifyTokenRequest, VerifyTokenResponse,
};
use crate::handlers::InboxHandlers;
use crate::middleware::{create_cors_layer, TracingLayer};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceBuilder;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handlers: Arc<InboxHandlers>,
}

/// Build the full router with middleware applied.
pub fn build_router(handlers: Arc<InboxHandlers>, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
        .layer(DefaultBodyLimit::max(config.limits.max_upload_size));

    Router::new()
        .route("/verify_token", post(verify_token))
        .route("/upload", post(upload))
        .route("/download", post(download))
        .route("/inbox/:receiver_email", get(list_inbox))
        .route("/health", get(health_check))
        .layer(middleware)
        .with_state(AppState { handlers })
}

async fn verify_token(
    State(state): State<AppState>,
    body: Bytes,
) -> InboxResult<Json<VerifyTokenResponse>> {
    let request: VerifyTokenRequest = parse_json_body(&body)?;
    state.handlers.verify_token(request).await.map(Json)
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> InboxResult<Json<UploadResponse>> {
    let multipart = multipart.map_err(|e| InboxError::MalformedRequest(e.body_text()))?;

    let mut form = read_upload_form(multipart).await?;
    form.authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.handlers.upload(form).await.map(Json)
}

async fn download(State(state): State<AppState>, body: Bytes) -> InboxResult<Response> {
    let request: DownloadRequest = parse_json_body(&body)?;
    let image = state.handlers.download(request).await?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}

async fn list_inbox(
    State(state): State<AppState>,
    Path(receiver_email): Path<String>,
    headers: HeaderMap,
) -> InboxResult<Json<Vec<ArtifactMetadata>>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    state
        .handlers
        .list_inbox(&receiver_email, authorization)
        .await
        .map(Json)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "inbox-gateway",
        "version": crate::VERSION
    }))
}

/// Decode a JSON body; an empty body reads as `{}`.
fn parse_json_body<T: DeserializeOwned + Default>(body: &[u8]) -> InboxResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Drain the whole form before any check runs, so field order never
/// changes which error a request gets.
async fn read_upload_form(mut multipart: Multipart) -> InboxResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            // Only a file part counts as the image
            Some("image") => {
                if let Some(file_name) = field.file_name().map(str::to_string) {
                    let bytes = field.bytes().await?.to_vec();
                    form.image = Some(UploadedImage { file_name, bytes });
                }
            }
            Some("id_token") => form.id_token = Some(field.text().await?),
            Some("sender_email") => form.sender_email = Some(field.text().await?),
            Some("receiver_email") => form.receiver_email = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{InboxFixture, MultipartBuilder};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app(fixture: &InboxFixture) -> Router {
        let mut config = GatewayConfig::default();
        config.limits.max_upload_size = 64 * 1024;
        build_router(fixture.handlers.clone(), &config)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_parse_json_body_empty_is_default() {
        let req: VerifyTokenRequest = parse_json_body(b"").unwrap();
        assert!(req.token().is_none());
        let req: VerifyTokenRequest = parse_json_body(b"  \n").unwrap();
        assert!(req.token().is_none());
        assert!(matches!(
            parse_json_body::<VerifyTokenRequest>(b"{oops"),
            Err(InboxError::MalformedRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_health() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "inbox-gateway");
    }

    #[tokio::test]
    async fn test_verify_token_empty_body() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(Request::post("/verify_token").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing token");
    }

    #[tokio::test]
    async fn test_verify_token_ok() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(post_json("/verify_token", r#"{"id_token":"T_alice"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Token is valid");
        assert_eq!(body["email"], "alice@x");
        assert_eq!(body["user_id"], "sub-alice@x");
    }

    #[tokio::test]
    async fn test_verify_token_malformed_json() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(post_json("/verify_token", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_field_order_does_not_matter() {
        let fixture = InboxFixture::standard();
        let (content_type, body) = MultipartBuilder::new()
            .file("image", "cat.gif", "image/gif", b"GIF89a")
            .text("receiver_email", "bob@x")
            .text("sender_email", "alice@x")
            .text("id_token", "T_alice")
            .finish();

        let response = app(&fixture)
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Upload successful");
        assert!(body["filename"].as_str().unwrap().ends_with("_cat.gif"));
    }

    #[tokio::test]
    async fn test_upload_bearer_header() {
        let fixture = InboxFixture::standard();
        let (content_type, body) = MultipartBuilder::new()
            .text("sender_email", "alice@x")
            .text("receiver_email", "bob@x")
            .file("image", "cat.png", "image/png", b"png")
            .finish();

        let response = app(&fixture)
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::AUTHORIZATION, "Bearer T_alice")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_text_image_field_is_not_an_image() {
        let fixture = InboxFixture::standard();
        let (content_type, body) = MultipartBuilder::new()
            .text("id_token", "T_alice")
            .text("sender_email", "alice@x")
            .text("receiver_email", "bob@x")
            .text("image", "not a file")
            .finish();

        let response = app(&fixture)
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No image uploaded");
        assert!(fixture.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_token_field() {
        let fixture = InboxFixture::standard();
        let (content_type, body) = MultipartBuilder::new()
            .text("sender_email", "alice@x")
            .text("receiver_email", "bob@x")
            .file("image", "cat.png", "image/png", b"png")
            .finish();

        let response = app(&fixture)
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing ID token");
    }

    #[tokio::test]
    async fn test_upload_without_multipart_is_malformed() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(post_json("/upload", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_download_sets_content_type() {
        let fixture = InboxFixture::standard();
        let filename = fixture
            .handlers
            .upload(UploadForm {
                id_token: Some("T_alice".into()),
                image: Some(UploadedImage {
                    file_name: "pic.webp".into(),
                    bytes: b"RIFF....WEBP".to_vec(),
                }),
                sender_email: Some("alice@x".into()),
                receiver_email: Some("bob@x".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .filename;

        let body = serde_json::json!({ "token": "T_bob", "filename": filename }).to_string();
        let response = app(&fixture)
            .oneshot(post_json("/download", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"RIFF....WEBP");
    }

    #[tokio::test]
    async fn test_download_empty_body() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(Request::post("/download").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing parameters");
    }

    #[tokio::test]
    async fn test_inbox_returns_json_array() {
        let fixture = InboxFixture::standard();
        let response = app(&fixture)
            .oneshot(Request::get("/inbox/bob@x").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let fixture = InboxFixture::standard();
        let (content_type, body) = MultipartBuilder::new()
            .text("id_token", "T_alice")
            .text("sender_email", "alice@x")
            .text("receiver_email", "bob@x")
            .file("image", "big.png", "image/png", &vec![0u8; 128 * 1024])
            .finish();

        let response = app(&fixture)
            .oneshot(
                Request::post("/upload")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(fixture.artifacts.is_empty());
    }
}
