//! HTTP gateway against an in-process stamping service

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Multipart,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use stamp_client::{GatewayConfig, HttpStampGateway};
use stamp_core::{
    EditorSession, GatewayError, MultiStampRequest, PdfCoordinates, SessionState,
    SingleStampRequest, SourceFile, StampGateway,
};

// ============================================================
// Fake service
// ============================================================

/// Echo every multipart field back as JSON so tests can inspect the upload.
/// Files are summarized as `file:<name>:<content-type>:<len>`.
async fn echo_fields(mut multipart: Multipart) -> impl IntoResponse {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap_or_default();
        let value = match file_name {
            Some(file) => format!("file:{}:{}:{}", file, content_type, data.len()),
            None => String::from_utf8_lossy(&data).into_owned(),
        };
        fields.insert(name, value);
    }
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        serde_json::to_vec(&fields).unwrap_or_default(),
    )
}

async fn reject() -> impl IntoResponse {
    (StatusCode::UNPROCESSABLE_ENTITY, "Image could not be decoded")
}

async fn reject_silently() -> impl IntoResponse {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn stall() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn echo_service() -> SocketAddr {
    spawn(
        Router::new()
            .route("/", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/pdf/stamp", post(echo_fields))
            .route("/pdf/stamp-multi", post(echo_fields)),
    )
    .await
}

fn gateway_for(addr: SocketAddr) -> HttpStampGateway {
    HttpStampGateway::new(GatewayConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 5,
        ..GatewayConfig::default()
    })
    .unwrap()
}

fn pdf() -> SourceFile {
    SourceFile::pdf("lease.pdf", b"%PDF-1.7 body".to_vec())
}

fn image() -> SourceFile {
    SourceFile::new("sig.png", "image/png", vec![0x89, b'P', b'N', b'G', 0, 0])
}

fn echoed(bytes: &[u8]) -> HashMap<String, String> {
    serde_json::from_slice(bytes).unwrap()
}

// ============================================================
// Health
// ============================================================

#[tokio::test]
async fn test_health_reports_reachable_service() {
    let addr = echo_service().await;
    assert!(gateway_for(addr).health().await);
}

#[tokio::test]
async fn test_health_tolerates_dead_host() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(!gateway_for(addr).health().await);
}

// ============================================================
// Stamping
// ============================================================

#[tokio::test]
async fn test_single_stamp_sends_files_and_coordinates() {
    let addr = echo_service().await;
    let request = SingleStampRequest {
        pdf: pdf(),
        image: image(),
        coords: PdfCoordinates {
            x: 40.0,
            y: 20.5,
            width: 100.0,
            height: 50.0,
            page: None,
        },
    };

    let document = gateway_for(addr).stamp_single(&request).await.unwrap();
    assert_eq!(document.content_type, "application/pdf");

    let fields = echoed(&document.bytes);
    assert_eq!(fields["pdf"], "file:lease.pdf:application/pdf:13");
    assert_eq!(fields["image"], "file:sig.png:image/png:6");
    assert_eq!(fields["x"], "40");
    assert_eq!(fields["y"], "20.5");
    assert_eq!(fields["width"], "100");
    assert_eq!(fields["height"], "50");
}

#[tokio::test]
async fn test_multi_stamp_sends_ordered_json() {
    let addr = echo_service().await;
    let request = MultiStampRequest {
        pdf: pdf(),
        image: image(),
        coords: vec![
            PdfCoordinates {
                x: 50.0,
                y: 50.0,
                width: 120.0,
                height: 60.0,
                page: Some(1),
            },
            PdfCoordinates {
                x: 80.0,
                y: 80.0,
                width: 150.0,
                height: 70.0,
                page: Some(2),
            },
        ],
    };

    let document = gateway_for(addr).stamp_multi(&request).await.unwrap();
    let fields = echoed(&document.bytes);
    assert_eq!(
        fields["coordinates"],
        concat!(
            r#"[{"x":50.0,"y":50.0,"width":120.0,"height":60.0,"page":1},"#,
            r#"{"x":80.0,"y":80.0,"width":150.0,"height":70.0,"page":2}]"#,
        )
    );
    let sent: Vec<PdfCoordinates> = serde_json::from_str(&fields["coordinates"]).unwrap();
    assert_eq!(sent, request.coords);
    assert!(fields.contains_key("pdf"));
    assert!(fields.contains_key("image"));
}

// ============================================================
// Failure classification
// ============================================================

#[tokio::test]
async fn test_server_rejection_carries_status_and_text() {
    let addr = spawn(Router::new().route("/pdf/stamp", post(reject))).await;
    let request = SingleStampRequest {
        pdf: pdf(),
        image: image(),
        coords: PdfCoordinates {
            x: 1.0,
            y: 1.0,
            width: 20.0,
            height: 20.0,
            page: None,
        },
    };

    let err = gateway_for(addr).stamp_single(&request).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Stamp {
            status: 422,
            message: "Image could not be decoded".to_string(),
        }
    );
}

#[tokio::test]
async fn test_empty_error_body_falls_back_to_reason() {
    let addr = spawn(Router::new().route("/pdf/stamp-multi", post(reject_silently))).await;
    let request = MultiStampRequest {
        pdf: pdf(),
        image: image(),
        coords: Vec::new(),
    };

    let err = gateway_for(addr).stamp_multi(&request).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Stamp {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unreachable_host_is_connectivity_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = SingleStampRequest {
        pdf: pdf(),
        image: image(),
        coords: PdfCoordinates {
            x: 1.0,
            y: 1.0,
            width: 20.0,
            height: 20.0,
            page: None,
        },
    };
    let err = gateway_for(addr).stamp_single(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Connectivity(_)));
}

#[tokio::test]
async fn test_slow_service_is_not_reported_unreachable() {
    let addr = spawn(Router::new().route("/pdf/stamp", post(stall))).await;
    let gateway = HttpStampGateway::new(GatewayConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 1,
        ..GatewayConfig::default()
    })
    .unwrap();
    let request = SingleStampRequest {
        pdf: pdf(),
        image: image(),
        coords: PdfCoordinates {
            x: 1.0,
            y: 1.0,
            width: 20.0,
            height: 20.0,
            page: None,
        },
    };

    let err = gateway.stamp_single(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)), "got {:?}", err);
}

// ============================================================
// Session over HTTP
// ============================================================

#[tokio::test]
async fn test_session_round_trip_over_http() {
    let addr = echo_service().await;
    let gateway = gateway_for(addr);

    let mut session = EditorSession::new();
    session.load_pdf(pdf());
    session.load_image(image());
    assert!(session.refresh_health(&gateway).await);

    session.add_signature().unwrap();
    session.set_scale(1.25).unwrap();
    session.stamp_pdf(&gateway).await.unwrap();
    assert_eq!(session.state(), SessionState::Previewing);

    let preview = echoed(session.preview_artifact().unwrap().bytes());
    assert_eq!(preview["x"], "50");
    assert_eq!(preview["width"], "120");

    session.on_preview_pages_loaded(2);
    session.save_final_pdf(&gateway).await.unwrap();
    assert_eq!(session.state(), SessionState::Finalized);

    let finalized = echoed(session.final_artifact().unwrap().bytes());
    let sent: Vec<PdfCoordinates> = serde_json::from_str(&finalized["coordinates"]).unwrap();
    let pages: Vec<Option<u32>> = sent.iter().map(|c| c.page).collect();
    assert_eq!(pages, vec![Some(1), Some(2)]);
}
