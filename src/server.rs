use crate::error::RelayError;
use crate::relay_state::{RelayConfig, RelayState};
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use futures_util::StreamExt;
use std::io::Write;

#[get("/health")]
pub async fn health(_req: HttpRequest, _: web::Data<RelayState>) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[post("/api/chat")]
pub async fn chat(
    _req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<RelayState>,
) -> Result<HttpResponse, RelayError> {
    // The credential check comes before the body is even read.
    app_state.require_api_key()?;
    let body = read_body(payload, app_state.max_payload_size).await?;
    app_state.chat(&body).await
}

/// Collects the request body, failing with a JSON 413 once it grows past `limit`.
pub async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::Bytes, RelayError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(RelayError::internal)?;
        if body.len() + chunk.len() > limit {
            log::error!("Payload too large: body exceeds limit of {limit} bytes");
            return Err(RelayError::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Registers the relay routes. The caller provides `web::Data<RelayState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(chat);
}

pub fn init_logging(level: log::LevelFilter) {
    // try_init: tests and embedders may have installed a logger already
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .try_init();
}

pub async fn startup(relay_config: RelayConfig, relay_state: RelayState) -> std::io::Result<()> {
    let app_state = web::Data::new(relay_state);

    log::info!(
        "Starting server at {}:{}, relaying to {} (deployment {}, api key configured: {}, max payload {} bytes)",
        relay_config.host,
        relay_config.port,
        app_state.endpoint_url,
        app_state.deployment,
        app_state.has_api_key(),
        app_state.max_payload_size
    );

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((relay_config.host, relay_config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
