use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use board_server::auth::AccessPolicy;
use board_server::{configure_routes, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cors(config: &Settings) -> Cors {
    Cors::default()
        .allowed_origin(&config.cors.allowed_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> board_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = AppState::new(config.clone()).await?;
    let data = web::Data::new(state.clone());

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // The last wrap runs first: CORS, the gate, then the policy.
    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(AccessPolicy::default())
            .wrap(server_state.request_gate())
            .wrap(cors(&server_state.config))
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    state.shutdown().await?;
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::header, test, HttpResponse};

    #[actix_web::test]
    async fn test_preflight_allows_custom_headers() {
        let settings = Settings::new_for_test().expect("Failed to load test config");
        let app = test::init_service(
            App::new()
                .wrap(cors(&settings))
                .route("/api/getPosts", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/getPosts")
            .insert_header((header::ORIGIN, settings.cors.allowed_origin.as_str()))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "x-request-id"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let allowed = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(allowed.contains("x-request-id"));
    }
}
