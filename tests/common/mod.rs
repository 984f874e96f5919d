// Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_upstream;

use std::net::TcpListener;

use actix_web::{App, HttpServer, web};
use chat_relay::relay_state::{ApiKey, RelayConfig, RelayState};
use chat_relay::server;

pub const TEST_API_KEY: &str = "test-key-123";

pub fn relay_state(endpoint_url: &str, api_key: Option<&str>) -> RelayState {
    let config = RelayConfig {
        endpoint_url: endpoint_url.to_string(),
        api_key: api_key.map(ApiKey::new),
        ..RelayConfig::default()
    };
    RelayState::new(&config).expect("relay state")
}

/// Keeps an ephemeral port bound and closes every connection before a
/// response is written, so callers see a transport failure. Returns the base URL.
pub fn start_hangup_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            drop(stream);
        }
    });
    format!("http://127.0.0.1:{port}")
}

/// Runs the relay on an ephemeral port and returns its base URL.
pub fn start_relay(state: RelayState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind relay");
    let port = listener.local_addr().expect("local addr").port();
    let data = web::Data::new(state);
    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(server::configure))
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen relay")
        .run();
    actix_web::rt::spawn(server);
    format!("http://127.0.0.1:{port}")
}
