//! # API Tests
//!
//! End-to-end tests for the HTTP routes, driven against the recording
//! dummy backend. Every test builds a fresh router with `oneshot`, so no
//! sockets are bound and no hardware is touched.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use impresora::ImpresoraError;
use impresora::backend::{BarcodeJob, ImageJob, PrintBackend};
use impresora::backend::dummy::{DummyBackend, Op, Recorder};
use impresora::config::{Alignment, FormatDefaults, PrinterConfig};
use impresora::server::{self, AppState};

/// Build a router backed by a recording dummy printer.
///
/// Mirrors startup: config from variables, then formatting defaults
/// applied to the freshly connected backend.
fn test_app(extra_vars: &[(&str, &str)]) -> (Router, Recorder) {
    let mut vars: HashMap<String, String> =
        [("PRINTER_TYPE".to_string(), "dummy".to_string())].into();
    for (k, v) in extra_vars {
        vars.insert(k.to_string(), v.to_string());
    }

    let config = PrinterConfig::from_vars(&vars).expect("test config must load");
    let mut backend = DummyBackend::new();
    let recorder = backend.recorder();
    backend
        .apply_defaults(&config.format)
        .expect("dummy accepts defaults");

    let state = Arc::new(AppState::new(config, Box::new(backend)));
    (server::router(state), recorder)
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// A tiny valid PNG, produced with the same image stack the server uses.
fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

const BOUNDARY: &str = "impresora-test-boundary";

fn multipart_body(content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"upload.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_image(app: Router, uri: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(content_type, bytes)))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[derive(Default)]
struct FaultyCounts {
    texts: usize,
    cuts: usize,
}

/// Backend for the failure paths the recording dummy cannot reach:
/// it reports a chosen online state and errors out of `print_text`
/// once the allowed number of writes is used up.
struct FaultyBackend {
    online: bool,
    texts_before_failure: usize,
    counts: Arc<Mutex<FaultyCounts>>,
}

impl PrintBackend for FaultyBackend {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn is_online(&mut self) -> bool {
        self.online
    }

    fn apply_defaults(&mut self, _format: &FormatDefaults) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn justify(&mut self, _alignment: Alignment) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn print_text(&mut self, _text: &str) -> Result<(), ImpresoraError> {
        let mut counts = self.counts.lock().unwrap();
        counts.texts += 1;
        if counts.texts > self.texts_before_failure {
            return Err(ImpresoraError::Transport(
                "connection reset by printer".to_string(),
            ));
        }
        Ok(())
    }

    fn print_qr(&mut self, _content: &str, _size: u8) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn print_barcode(&mut self, _job: &BarcodeJob) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn print_image(&mut self, _job: &ImageJob) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn feed(&mut self, _lines: u8) -> Result<(), ImpresoraError> {
        Ok(())
    }

    fn cut(&mut self) -> Result<(), ImpresoraError> {
        self.counts.lock().unwrap().cuts += 1;
        Ok(())
    }
}

fn faulty_app(online: bool, texts_before_failure: usize) -> (Router, Arc<Mutex<FaultyCounts>>) {
    let vars: HashMap<String, String> =
        [("PRINTER_TYPE".to_string(), "dummy".to_string())].into();
    let config = PrinterConfig::from_vars(&vars).expect("test config must load");

    let counts = Arc::new(Mutex::new(FaultyCounts::default()));
    let backend = FaultyBackend {
        online,
        texts_before_failure,
        counts: Arc::clone(&counts),
    };

    let state = Arc::new(AppState::new(config, Box::new(backend)));
    (server::router(state), counts)
}

// ============================================================================
// HEALTH AND CONFIG
// ============================================================================

#[tokio::test]
async fn health_reports_running_and_online() {
    let (app, _) = test_app(&[]);
    let (status, json) = send(app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Printer API is running");
    assert_eq!(json["printer_status"], "online");
}

#[tokio::test]
async fn config_echoes_active_transport_only() {
    let (app, _) = test_app(&[("PRINTER_ALIGNMENT", "center")]);
    let (status, json) = send(app, "GET", "/config/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transport"]["type"], "dummy");
    assert_eq!(json["format"]["alignment"], "center");
    // No foreign transport fields leak into the echo.
    assert!(json["transport"].get("host").is_none());
    assert!(json["transport"].get("vendor_id").is_none());
    assert!(json["transport"].get("baud_rate").is_none());
}

// ============================================================================
// TEXT AND QR
// ============================================================================

#[tokio::test]
async fn print_two_copies_with_cut_records_two_sequences() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send(app, "POST", "/print/?content=Hello&copies=2&cut=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Content printed.");
    assert_eq!(
        recorder.ops(),
        vec![
            Op::ApplyDefaults {
                alignment: Alignment::Left
            },
            Op::Justify(Alignment::Left),
            Op::Text("Hello".to_string()),
            Op::Cut,
            Op::Text("Hello".to_string()),
            Op::Cut,
            Op::Justify(Alignment::Left),
        ]
    );
}

#[tokio::test]
async fn print_without_cut_skips_the_cutter() {
    let (app, recorder) = test_app(&[]);
    let (status, _) = send(app, "POST", "/print/?content=Hello&cut=false").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!recorder.ops().contains(&Op::Cut));
}

#[tokio::test]
async fn print_rejects_zero_copies_before_any_transport_call() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send(app, "POST", "/print/?content=Hello&copies=0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("copies"));
    // Only the startup defaults were ever written.
    assert_eq!(recorder.writes(), 1);
}

#[tokio::test]
async fn print_rejects_negative_copies() {
    let (app, _) = test_app(&[]);
    let (status, _) = send(app, "POST", "/print/?content=Hello&copies=-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn print_rejects_blank_content() {
    let (app, _) = test_app(&[]);
    let (status, json) = send(app, "POST", "/print/?content=+").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("content"));
}

#[tokio::test]
async fn print_applies_alignment_override_and_restores_default() {
    let (app, recorder) = test_app(&[]);
    let (status, _) =
        send(app, "POST", "/print/?content=Hola&alignment=center&copies=1&cut=false").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        recorder.ops(),
        vec![
            Op::ApplyDefaults {
                alignment: Alignment::Left
            },
            Op::Justify(Alignment::Center),
            Op::Text("Hola".to_string()),
            Op::Justify(Alignment::Left),
        ]
    );
}

#[tokio::test]
async fn print_rejects_unknown_alignment() {
    let (app, _) = test_app(&[]);
    let (status, json) = send(app, "POST", "/print/?content=Hola&alignment=diagonal").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("diagonal"));
}

#[tokio::test]
async fn qr_renders_with_requested_size() {
    let (app, recorder) = test_app(&[]);
    let (status, _) = send(app, "POST", "/print/?content=https://example.com&qr=true&size=10&cut=false").await;

    assert_eq!(status, StatusCode::OK);
    assert!(recorder.ops().contains(&Op::Qr {
        content: "https://example.com".to_string(),
        size: 10,
    }));
}

#[tokio::test]
async fn qr_size_is_range_checked() {
    let (app, recorder) = test_app(&[]);

    let (status, json) = send(app.clone(), "POST", "/print/?content=x&qr=true&size=17").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("size"));

    let (status, _) = send(app, "POST", "/print/?content=x&qr=true&size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(recorder.writes(), 1);
}

// ============================================================================
// BARCODES
// ============================================================================

#[tokio::test]
async fn barcode_prints_with_defaults() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send(app, "POST", "/barcode/?code=4006381333931&type=EAN13").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Barcode printed.");
    assert_eq!(
        recorder.ops()[1..],
        [
            Op::Barcode {
                code: "4006381333931".to_string(),
                kind: "EAN13".to_string(),
                height: 64,
                width: 3,
            },
            Op::Cut,
        ]
    );
}

#[tokio::test]
async fn barcode_copies_repeat_the_full_sequence() {
    let (app, recorder) = test_app(&[]);
    let (status, _) =
        send(app, "POST", "/barcode/?code=12345678&type=ITF&copies=3&cut=true").await;

    assert_eq!(status, StatusCode::OK);
    let cuts = recorder.ops().iter().filter(|op| **op == Op::Cut).count();
    assert_eq!(cuts, 3);
}

#[tokio::test]
async fn barcode_center_flag_wraps_the_job_in_justify_calls() {
    let (app, recorder) = test_app(&[]);
    let (status, _) =
        send(app, "POST", "/barcode/?code=12345678&type=ITF&center=true&cut=false").await;

    assert_eq!(status, StatusCode::OK);
    let ops = recorder.ops();
    assert_eq!(ops[1], Op::Justify(Alignment::Center));
    assert_eq!(*ops.last().unwrap(), Op::Justify(Alignment::Left));
}

#[tokio::test]
async fn barcode_rejects_unknown_symbology() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send(app, "POST", "/barcode/?code=123&type=QRCODE").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("QRCODE"));
    assert_eq!(recorder.writes(), 1);
}

#[tokio::test]
async fn barcode_dimensions_are_range_checked() {
    let (app, _) = test_app(&[]);

    let (status, json) =
        send(app.clone(), "POST", "/barcode/?code=123&type=EAN8&height=300").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("height"));

    let (status, json) = send(app.clone(), "POST", "/barcode/?code=123&type=EAN8&width=7").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("width"));

    let (status, json) =
        send(app, "POST", "/barcode/?code=123&type=EAN8&position=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn barcode_rejects_empty_code() {
    let (app, _) = test_app(&[]);
    let (status, json) = send(app, "POST", "/barcode/?code=+&type=EAN13").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("code"));
}

// ============================================================================
// IMAGES
// ============================================================================

#[tokio::test]
async fn image_prints_each_copy() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send_image(
        app,
        "/image/?copies=2&cut=false",
        "image/png",
        &png_bytes(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Image printed.");
    let images = recorder
        .ops()
        .iter()
        .filter(|op| matches!(op, Op::Image { .. }))
        .count();
    assert_eq!(images, 2);
}

#[tokio::test]
async fn image_records_requested_mode() {
    let (app, recorder) = test_app(&[]);
    let (status, _) = send_image(
        app,
        "/image/?impl=bitImageColumn&cut=false",
        "image/png",
        &png_bytes(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(recorder.ops().iter().any(|op| matches!(
        op,
        Op::Image { mode, .. } if mode == "BitImageColumn"
    )));
}

#[tokio::test]
async fn image_rejects_unsupported_content_type() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send_image(app, "/image/", "text/plain", b"not an image").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("unsupported"));
    assert_eq!(recorder.writes(), 1);
}

#[tokio::test]
async fn image_rejects_undecodable_bytes() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send_image(app, "/image/", "image/png", b"definitely not a png").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("decodable"));
    assert_eq!(recorder.writes(), 1);
}

#[tokio::test]
async fn image_rejects_unknown_impl_mode() {
    let (app, _) = test_app(&[]);
    let (status, json) =
        send_image(app, "/image/?impl=hologram", "image/png", &png_bytes()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("hologram"));
}

#[tokio::test]
async fn image_requires_a_file() {
    let (app, _) = test_app(&[]);
    let body = format!("--{BOUNDARY}--\r\n");
    let response = server_request_with_body(app, "/image/", body.into_bytes()).await;
    assert_eq!(response.0, StatusCode::BAD_REQUEST);
    assert!(response.1["message"].as_str().unwrap().contains("file"));
}

async fn server_request_with_body(app: Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// ============================================================================
// CUT
// ============================================================================

#[tokio::test]
async fn cut_issues_exactly_one_cut() {
    let (app, recorder) = test_app(&[]);
    let (status, json) = send(app, "POST", "/cut/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Paper cut.");
    assert_eq!(recorder.ops()[1..], [Op::Cut]);
}

// ============================================================================
// SERIALIZATION ACROSS REQUESTS
// ============================================================================

#[tokio::test]
async fn concurrent_prints_do_not_interleave() {
    let (app, recorder) = test_app(&[]);

    let first = send(app.clone(), "POST", "/print/?content=alpha&cut=true");
    let second = send(app, "POST", "/print/?content=beta&cut=true");
    let ((s1, _), (s2, _)) = tokio::join!(first, second);
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);

    // Whichever order the jobs ran in, each one's sequence must be
    // contiguous: justify, text, cut, justify-restore.
    let ops = recorder.ops();
    for content in ["alpha", "beta"] {
        let at = ops
            .iter()
            .position(|op| *op == Op::Text(content.to_string()))
            .expect("both jobs printed");
        assert_eq!(ops[at - 1], Op::Justify(Alignment::Left));
        assert_eq!(ops[at + 1], Op::Cut);
        assert_eq!(ops[at + 2], Op::Justify(Alignment::Left));
    }
}

// ============================================================================
// FAILURE PATHS
// ============================================================================

#[tokio::test]
async fn print_aborts_remaining_copies_on_transport_error() {
    // First copy goes through, the second text write dies mid-job.
    let (app, counts) = faulty_app(true, 1);
    let (status, json) = send(app, "POST", "/print/?content=Hello&copies=5&cut=true").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["message"].as_str().expect("error reply carries a message");
    assert!(message.contains("print"), "got: {message}");

    // Copy one printed and cut, copy two failed on the text write, and
    // copies three through five were never attempted.
    let counts = counts.lock().unwrap();
    assert_eq!(counts.texts, 2);
    assert_eq!(counts.cuts, 1);
}

#[tokio::test]
async fn health_degrades_when_printer_reports_offline() {
    let (app, _) = faulty_app(false, usize::MAX);
    let (status, json) = send(app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Printer API is running");
    assert_eq!(json["printer_status"], "offline");
}
