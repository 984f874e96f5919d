// Mock inference service for testing
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::StatusCode, web};
use serde_json::Value;

/// What the mock answers to every scoring request.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: Value) -> Self {
        CannedResponse {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        CannedResponse {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct MockState {
    canned: CannedResponse,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockUpstream {
    pub url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    /// Starts the mock on an ephemeral port. Must run inside an actix system.
    pub fn start(canned: CannedResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock upstream");
        let port = listener.local_addr().expect("local addr").port();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(MockState {
            canned,
            recorded: recorded.clone(),
        });

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .app_data(web::PayloadConfig::default().limit(64 * 1024 * 1024))
                .route("/score", web::post().to(score))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen mock upstream")
        .run();
        actix_web::rt::spawn(server);

        MockUpstream {
            url: format!("http://127.0.0.1:{port}/score"),
            recorded,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }
}

async fn score(req: HttpRequest, body: web::Bytes, state: web::Data<MockState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .recorded
        .lock()
        .unwrap()
        .push(RecordedRequest { headers, body });

    let canned = &state.canned;
    HttpResponse::build(StatusCode::from_u16(canned.status).unwrap())
        .content_type(canned.content_type)
        .body(canned.body.clone())
}
