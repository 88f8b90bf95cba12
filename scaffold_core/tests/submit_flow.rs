//! End-to-end submission against a throwaway local HTTP server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use scaffold_core::form::{FieldName, InsideType, Location};
use scaffold_core::launch::LaunchUrl;
use scaffold_core::token_store::{MemoryTokenStore, TokenStore};
use scaffold_core::api::TOKEN_EXCHANGE_FAILED;
use scaffold_core::{ApiClient, Config, ExportFormat, ViewState};

/// Serve exactly one request with `body`, handing the raw request back.
fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        tx.send(String::from_utf8_lossy(&raw).to_string()).unwrap();
    });

    (base_url, rx)
}

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(Config::default().with_api_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn successful_calculation_populates_result() {
    let (base_url, requests) = serve_once(
        "200 OK",
        r#"{"success":true,"volume":42.5,"formula":"L*H","formulaBreakdown":["L=10","H=4.25"],"justification":{"title":"Norm","text":"..."}}"#,
    );
    let client = client_for(&base_url);
    let mut store = MemoryTokenStore::new();

    let mut state = ViewState::new();
    let launch = LaunchUrl::parse("https://calc.example.ru/?token=url-token").unwrap();
    let plan = state.mount(&launch.params, &mut store);
    assert!(plan.clean_url);
    assert_eq!(launch.cleaned, "https://calc.example.ru/");

    state.select_location(Location::Outside);
    state.edit_field(FieldName::Length, "10");
    state.edit_field(FieldName::Height, "4.25");
    state.edit_field(FieldName::RoomWidth, "7");

    let submission = state.begin_submit(&mut store).unwrap();
    let outcome = client.calculate(&submission.token, &submission.request).await;
    state.finish_submit(outcome, &mut store);

    let raw_request = requests.recv().unwrap();
    assert!(raw_request.starts_with("POST /api/calculate/scaffolding HTTP/1.1"));
    assert!(raw_request.to_ascii_lowercase().contains("authorization: url-token"));
    assert!(raw_request.contains(r#""length":10.0"#));
    assert!(!raw_request.contains("roomWidth"));

    assert!(!state.busy);
    let result = state.result().expect("result expected");
    assert_eq!(result.volume_display(), "42.5");
    assert_eq!(result.formula_breakdown, vec!["L=10", "H=4.25"]);

    let file = state.export(ExportFormat::Word).unwrap();
    assert_eq!(file.filename, "raschet-lesov.doc");
}

#[tokio::test]
async fn expired_token_is_cleared() {
    let (base_url, _requests) = serve_once(
        "401 Unauthorized",
        r#"{"success":false,"message":"token expired"}"#,
    );
    let client = client_for(&base_url);
    let mut store = MemoryTokenStore::with_token("stale");

    let mut state = ViewState::new();
    state.mount(&Default::default(), &mut store);
    state.select_location(Location::Inside);
    state.select_inside_type(InsideType::Walls);
    state.edit_field(FieldName::ScaffoldWidth, "1.5");
    state.edit_field(FieldName::WallsLength, "36");

    let submission = state.begin_submit(&mut store).unwrap();
    let outcome = client.calculate(&submission.token, &submission.request).await;
    state.finish_submit(outcome, &mut store);

    assert_eq!(state.error(), Some("token expired"));
    assert_eq!(state.token, "");
    assert_eq!(store.load(), None);
    assert!(state.export(ExportFormat::Word).is_err());
}

#[tokio::test]
async fn payment_redirect_yields_token() {
    let (base_url, requests) = serve_once("200 OK", r#"{"success":true,"token":"paid-token"}"#);
    let client = client_for(&base_url);
    let mut store = MemoryTokenStore::new();

    let mut state = ViewState::new();
    let launch = LaunchUrl::parse("https://calc.example.ru/?userId=42&paymentId=p-9").unwrap();
    let plan = state.mount(&launch.params, &mut store);
    let exchange = plan.exchange.expect("exchange expected");

    let outcome = client.exchange_payment(&exchange.user_id, &exchange.payment_id).await;
    state.finish_token_exchange(outcome, &mut store);

    let raw_request = requests.recv().unwrap();
    assert!(raw_request.starts_with("GET /api/payment/success?userId=42&paymentId=p-9 HTTP/1.1"));
    assert_eq!(state.token, "paid-token");
    assert_eq!(store.load().as_deref(), Some("paid-token"));
    assert!(!state.busy);
}

#[tokio::test]
async fn failed_payment_exchange_keeps_stored_token() {
    let (base_url, _requests) = serve_once("502 Bad Gateway", "<html>bad gateway</html>");
    let client = client_for(&base_url);
    let mut store = MemoryTokenStore::with_token("previous");

    let mut state = ViewState::new();
    let launch = LaunchUrl::parse("https://calc.example.ru/?userId=42&paymentId=p-9").unwrap();
    let exchange = state.mount(&launch.params, &mut store).exchange.expect("exchange expected");

    let outcome = client.exchange_payment(&exchange.user_id, &exchange.payment_id).await;
    state.finish_token_exchange(outcome, &mut store);

    assert!(!state.busy);
    assert_eq!(state.error(), Some(TOKEN_EXCHANGE_FAILED));
    assert_eq!(state.token, "previous");
    assert_eq!(store.load().as_deref(), Some("previous"));
}
