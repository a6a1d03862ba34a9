//! End-to-end request flows through the real router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use inbox_gateway::test_utils::{InboxFixture, MultipartBuilder};
use inbox_gateway::{build_router, GatewayConfig};
use tower::ServiceExt;

const IMG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR fake image payload";

fn app(fixture: &InboxFixture) -> Router {
    build_router(fixture.handlers.clone(), &GatewayConfig::default())
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &Router, token: &str, sender: &str, receiver: &str) -> Response {
    let (content_type, body) = MultipartBuilder::new()
        .text("id_token", token)
        .text("sender_email", sender)
        .text("receiver_email", receiver)
        .file("image", "holiday.png", "image/png", IMG)
        .finish();

    app.clone()
        .oneshot(
            Request::post("/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn download(app: &Router, token: &str, filename: &str) -> Response {
    let body = serde_json::json!({ "id_token": token, "filename": filename });
    app.clone()
        .oneshot(
            Request::post("/download")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn inbox(app: &Router, email: &str) -> Response {
    app.clone()
        .oneshot(
            Request::get(format!("/inbox/{}", email))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn alice_sends_bob_an_image() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    let response = upload(&app, "T_alice", "alice@x", "bob@x").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["message"], "Upload successful");
    let filename = body["filename"].as_str().unwrap().to_string();

    // Receiver gets the exact bytes
    let response = download(&app, "T_bob", &filename).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], IMG);

    // Anyone else is refused
    let response = download(&app, "T_carol", &filename).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json(response).await["error"],
        "You are not authorized to download this image"
    );

    // Bob's inbox lists it
    let response = inbox(&app, "bob@x").await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = json(response).await;
    assert_eq!(
        listing,
        serde_json::json!([{
            "filename": filename,
            "sender_email": "alice@x",
            "receiver_email": "bob@x"
        }])
    );
}

#[tokio::test]
async fn impersonated_sender_is_rejected_without_writes() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    let response = upload(&app, "T_carol", "alice@x", "bob@x").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json(response).await["error"],
        "Sender email does not match verified token email"
    );

    assert!(fixture.artifacts.is_empty());
    assert!(fixture.metadata.is_empty());
    assert_eq!(json(inbox(&app, "bob@x").await).await, serde_json::json!([]));
}

#[tokio::test]
async fn invalid_token_is_bad_request() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    let response = upload(&app, "forged", "alice@x", "bob@x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Invalid token");
}

#[tokio::test]
async fn upload_requires_image_and_participants() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    let (content_type, body) = MultipartBuilder::new()
        .text("id_token", "T_alice")
        .text("sender_email", "alice@x")
        .text("receiver_email", "bob@x")
        .finish();
    let response = app
        .clone()
        .oneshot(
            Request::post("/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "No image uploaded");

    let (content_type, body) = MultipartBuilder::new()
        .text("id_token", "T_alice")
        .text("sender_email", "alice@x")
        .file("image", "a.png", "image/png", IMG)
        .finish();
    let response = app
        .oneshot(
            Request::post("/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await["error"],
        "Sender and receiver email required"
    );
}

#[tokio::test]
async fn download_of_unknown_file_is_not_found() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    let response = download(&app, "T_bob", "0123456789abcdef0123456789abcdef_x.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"], "Image not found");
}

#[tokio::test]
async fn inbox_only_holds_records_for_that_receiver() {
    let fixture = InboxFixture::standard();
    let app = app(&fixture);

    for (token, sender, receiver) in [
        ("T_alice", "alice@x", "bob@x"),
        ("T_carol", "carol@x", "bob@x"),
        ("T_bob", "bob@x", "carol@x"),
    ] {
        assert_eq!(
            upload(&app, token, sender, receiver).await.status(),
            StatusCode::OK
        );
    }

    let bob = json(inbox(&app, "bob@x").await).await;
    let bob = bob.as_array().unwrap();
    assert_eq!(bob.len(), 2);
    assert!(bob.iter().all(|m| m["receiver_email"] == "bob@x"));

    let carol = json(inbox(&app, "carol@x").await).await;
    assert_eq!(carol.as_array().unwrap().len(), 1);
    assert_eq!(carol[0]["sender_email"], "bob@x");

    let alice = json(inbox(&app, "alice@x").await).await;
    assert_eq!(alice, serde_json::json!([]));
}

#[tokio::test]
async fn inbox_auth_when_enabled() {
    let fixture = InboxFixture::with_inbox_auth(inbox_gateway::test_utils::standard_verifier());
    let app = app(&fixture);
    upload(&app, "T_alice", "alice@x", "bob@x").await;

    let response = inbox(&app, "bob@x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::get("/inbox/bob@x")
                .header(header::AUTHORIZATION, "Bearer T_alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            Request::get("/inbox/bob@x")
                .header(header::AUTHORIZATION, "Bearer T_bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await.as_array().unwrap().len(), 1);
}
