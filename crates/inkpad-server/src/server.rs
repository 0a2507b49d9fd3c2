use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post, put},
};
use inkpad_auth::{AccountService, AuthState, TokenService, http as auth_http};
use inkpad_storage::{DynNoteStorage, DynUserStorage};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::{
    assets::{DynAssetHost, create_asset_host},
    config::{AppConfig, StorageBackend, UploadProvider},
    handlers, middleware as app_middleware, notes,
    upload::{self, UploadState},
};

/// Room for multipart framing around an image of `upload.max_bytes`.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub notes: DynNoteStorage,
    pub accounts: AccountService,
    pub auth: AuthState,
    pub upload: UploadState,
}

impl AppState {
    pub fn new(
        cfg: &AppConfig,
        users: DynUserStorage,
        notes: DynNoteStorage,
        assets: DynAssetHost,
    ) -> Self {
        let tokens = Arc::new(TokenService::from_config(&cfg.auth));
        Self {
            accounts: AccountService::new(users, tokens.clone()),
            auth: AuthState::new(tokens),
            upload: UploadState {
                assets,
                limits: Arc::new(cfg.upload.clone()),
            },
            notes,
        }
    }
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for DynNoteStorage {
    fn from_ref(state: &AppState) -> Self {
        state.notes.clone()
    }
}

impl FromRef<AppState> for UploadState {
    fn from_ref(state: &AppState) -> Self {
        state.upload.clone()
    }
}

pub fn build_router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let upload_limit = cfg.upload.max_bytes + MULTIPART_OVERHEAD_BYTES;

    let mut router = Router::new()
        .route("/api/health", get(handlers::health))
        // Accounts
        .route("/api/auth/signup", post(auth_http::signup_handler))
        .route("/api/auth/login", post(auth_http::login_handler))
        // Notes, all behind BearerAuth
        .route("/api/notes/get", get(notes::list_notes))
        .route("/api/notes/post", post(notes::create_note))
        .route(
            "/api/notes/{id}",
            put(notes::update_note).delete(notes::delete_note),
        )
        .route(
            "/api/upload-image",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed);

    if cfg.upload.provider == UploadProvider::Local {
        router = router.nest_service("/uploads", ServeDir::new(&cfg.upload.local.dir));
    }

    router
        .with_state(state)
        // Middleware stack, innermost first. request_id must stay outside the
        // trace layer: make_span_with reads the id from the request extensions.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

/// Connects storage and the asset host described by `cfg`, then builds the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let (users, notes) = connect_storage(cfg).await?;
    let assets = create_asset_host(&cfg.upload, &cfg.server)?;
    Ok(build_router(AppState::new(cfg, users, notes, assets), cfg))
}

async fn connect_storage(cfg: &AppConfig) -> anyhow::Result<(DynUserStorage, DynNoteStorage)> {
    let storage = match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            inkpad_db_memory::create_storage()
        }
        StorageBackend::Postgres => {
            inkpad_db_postgres::create_storage(cfg.storage.postgres.clone()).await?
        }
    };
    tracing::info!(backend = %cfg.storage.backend, "storage ready");
    Ok(storage)
}

pub struct InkpadServer {
    addr: SocketAddr,
    app: Router,
}

#[derive(Default)]
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    config: AppConfig,
    storage: Option<(DynUserStorage, DynNoteStorage)>,
    assets: Option<DynAssetHost>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Uses the given storage instead of connecting to `storage.backend`.
    pub fn with_storage(mut self, users: DynUserStorage, notes: DynNoteStorage) -> Self {
        self.storage = Some((users, notes));
        self
    }

    /// Uses the given asset host instead of the one `upload.provider` selects.
    pub fn with_asset_host(mut self, assets: DynAssetHost) -> Self {
        self.assets = Some(assets);
        self
    }

    pub async fn build(self) -> anyhow::Result<InkpadServer> {
        let cfg = self.config;
        let (users, notes) = match self.storage {
            Some(storage) => storage,
            None => connect_storage(&cfg).await?,
        };
        let assets = match self.assets {
            Some(assets) => assets,
            None => create_asset_host(&cfg.upload, &cfg.server)?,
        };
        tracing::info!(asset_host = assets.name(), "asset host ready");

        let app = build_router(AppState::new(&cfg, users, notes, assets), &cfg);
        Ok(InkpadServer {
            addr: self.addr.unwrap_or_else(|| cfg.addr()),
            app,
        })
    }
}

impl InkpadServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn into_router(self) -> Router {
        self.app
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use inkpad_auth::AuthConfig;
    use tower::ServiceExt;
    use tracing::{
        field::{Field, Visit},
        span,
    };
    use tracing_subscriber::{
        Registry,
        layer::{Context, Layer, SubscriberExt},
    };

    use super::*;
    use crate::assets::LocalDiskHost;

    /// Records the `request_id` field of every `http.request` span.
    #[derive(Clone, Default)]
    struct SpanRequestIds(Arc<Mutex<Vec<String>>>);

    struct RequestIdField(Option<String>);

    impl Visit for RequestIdField {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "request_id" {
                self.0 = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for SpanRequestIds {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
            if attrs.metadata().name() != "http.request" {
                return;
            }
            let mut field = RequestIdField(None);
            attrs.record(&mut field);
            if let Some(value) = field.0 {
                self.0.lock().unwrap().push(value);
            }
        }
    }

    fn router() -> Router {
        let mut cfg = AppConfig::default();
        cfg.auth = AuthConfig::new("router-test-secret-value");
        cfg.upload.provider = UploadProvider::Local;
        let (users, notes) = inkpad_db_memory::create_storage();
        let assets: DynAssetHost = Arc::new(LocalDiskHost::new(
            cfg.upload.local.dir.clone(),
            cfg.server.public_base_url(),
        ));
        build_router(AppState::new(&cfg, users, notes, assets), &cfg)
    }

    async fn message_of(res: axum::response::Response) -> String {
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn trace_span_carries_request_id() {
        let captured = SpanRequestIds::default();
        let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

        let res = router()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(app_middleware::REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            res.headers().get(app_middleware::REQUEST_ID_HEADER).unwrap(),
            "req-42"
        );
        assert_eq!(*captured.0.lock().unwrap(), vec!["req-42".to_string()]);
    }

    #[tokio::test]
    async fn generated_request_id_reaches_span() {
        let captured = SpanRequestIds::default();
        let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

        let res = router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let echoed = res.headers().get(app_middleware::REQUEST_ID_HEADER).unwrap();
        assert_eq!(*captured.0.lock().unwrap(), vec![echoed.to_str().unwrap().to_string()]);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let res = router()
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(message_of(res).await, "Route not found");
    }

    #[tokio::test]
    async fn wrong_method_is_json_method_not_allowed() {
        let res = router()
            .oneshot(Request::builder().uri("/api/notes/post").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(message_of(res).await, "Method not allowed");
    }
}
