pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

use auth::{Argon2Encoder, AuthService, RequestGate, TokenCodec};
use board::BoardService;
use db::{BoardStore, CredentialStore, DbOperations, MemoryStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub codec: Arc<TokenCodec>,
    pub auth_service: Arc<AuthService>,
    pub board_service: Arc<BoardService>,
    db: Option<Arc<DbOperations>>,
}

impl AppState {
    /// Connects to Postgres and runs migrations, or falls back to the
    /// in-memory store for `memory:` URLs.
    pub async fn new(config: Settings) -> Result<Self> {
        if config.database.is_in_memory() {
            info!("Using in-memory store");
            return Self::in_memory(config);
        }

        let db = Arc::new(
            DbOperations::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(5),
            )
            .await?,
        );
        db.run_migrations().await?;
        info!("Database ready");

        let mut state = Self::with_stores(config, db.clone(), db.clone())?;
        state.db = Some(db);
        Ok(state)
    }

    pub fn in_memory(config: Settings) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    pub fn with_stores(
        config: Settings,
        credentials: Arc<dyn CredentialStore>,
        posts: Arc<dyn BoardStore>,
    ) -> Result<Self> {
        let codec = Arc::new(TokenCodec::from_config(&config.auth)?);
        let auth_service = Arc::new(AuthService::new(
            credentials.clone(),
            codec.clone(),
            Arc::new(Argon2Encoder::default()),
        ));
        let board_service = Arc::new(BoardService::new(posts, credentials));

        Ok(Self {
            config: Arc::new(config),
            codec,
            auth_service,
            board_service,
            db: None,
        })
    }

    pub fn request_gate(&self) -> RequestGate {
        RequestGate::new(self.codec.clone())
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.close().await;
        }
        Ok(())
    }
}

/// Registers every route. Middleware (gate, access policy, CORS) is added by
/// the caller so tests can assemble the same stack.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use auth::handlers as users;
    use board::handlers as board;

    cfg.route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/users")
                .route("/register", web::post().to(users::register))
                .route("/check-nickname", web::get().to(users::check_nickname))
                .route("/login", web::post().to(users::login))
                .route("/reissue", web::post().to(users::reissue)),
        )
        .service(
            web::scope("/api")
                .route("/create-posts", web::post().to(board::create_post))
                .route("/getPosts", web::get().to(board::list_posts))
                .route("/posts/{id}", web::get().to(board::get_post))
                .route("/posts/{id}", web::put().to(board::update_post))
                .route("/posts/{id}", web::delete().to(board::delete_post))
                .route("/posts/{post_id}/comments", web::get().to(board::list_comments))
                .route("/posts/{post_id}/comments", web::post().to(board::add_comment))
                .route(
                    "/posts/{post_id}/comments/{comment_id}",
                    web::delete().to(board::delete_comment),
                ),
        );
}
