//! Application startup and lifecycle management.
//!
//! Builds the shared state (Mongo connection, repositories, gateway client,
//! photo storage), wires the HTTP router, and runs the server. Binding to
//! port 0 yields a random port, which the integration tests rely on.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use institute_core::auth::JwtAuth;
use institute_core::error::AppError;
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::{
    AdmissionRepository, LocalStorage, PhotoStorage, RazorpayClient, RegistryRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub jwt: JwtAuth,
    pub repository: AdmissionRepository,
    pub registry: RegistryRepository,
    pub razorpay: RazorpayClient,
    pub storage: Arc<dyn PhotoStorage>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e.into())
            })?;
        client_options.app_name = Some(config.service_name.clone());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        let repository = AdmissionRepository::new(&db);
        repository.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize admission indexes: {}", e);
            AppError::DatabaseError(e)
        })?;

        let registry = RegistryRepository::new(&db);
        registry.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize registry indexes: {}", e);
            AppError::DatabaseError(e)
        })?;

        let razorpay = RazorpayClient::new(config.razorpay.clone());
        if razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - gateway payments will fail");
        }

        let storage: Arc<dyn PhotoStorage> =
            Arc::new(LocalStorage::new(config.uploads.base_path.clone()).await?);

        let jwt = JwtAuth::new(&config.jwt.secret);

        let state = AppState {
            db,
            config: config.clone(),
            jwt,
            repository,
            registry,
            razorpay,
            storage,
        };

        // Port 0 = random port for testing.
        let addr = (config.server.host.as_str(), config.server.port);
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(
                "Failed to bind listener to {}:{}: {}",
                config.server.host,
                config.server.port,
                e
            );
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Admission service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &mongodb::Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}

/// Assemble the full router: public health/metrics/uploads plus the
/// bearer-authenticated `/api` surface.
pub fn build_router(state: AppState) -> Router {
    let admissions = Router::new()
        .route(
            "/",
            post(handlers::admissions::create_admission).get(handlers::admissions::list_admissions),
        )
        .route("/stats", get(handlers::admissions::admission_stats))
        .route(
            "/:id",
            get(handlers::admissions::get_admission)
                .put(handlers::admissions::update_admission)
                .delete(handlers::admissions::delete_admission),
        );

    let payments = Router::new()
        .route("/create-order", post(handlers::payments::create_order))
        .route("/verify", post(handlers::payments::verify_payment))
        .route("/stats", get(handlers::payments::payment_stats))
        .route(
            "/admission/:admission_id",
            get(handlers::payments::admission_payments),
        )
        .route(
            "/installments",
            post(handlers::installments::create_installments),
        )
        .route(
            "/installments/:id",
            get(handlers::installments::admission_installments),
        )
        .route(
            "/installments/:id/pay",
            post(handlers::installments::pay_installment),
        );

    let branches = Router::new()
        .route(
            "/",
            post(handlers::branches::create_branch).get(handlers::branches::list_branches),
        )
        .route(
            "/:id",
            get(handlers::branches::get_branch)
                .put(handlers::branches::update_branch)
                .delete(handlers::branches::delete_branch),
        );

    let courses = Router::new()
        .route(
            "/",
            post(handlers::courses::create_course).get(handlers::courses::list_courses),
        )
        .route(
            "/:id",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        );

    let api = Router::new()
        .nest("/admissions", admissions)
        .nest("/payments", payments)
        .nest("/branches", branches)
        .nest("/courses", courses)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest_service(
            "/uploads",
            ServeDir::new(state.config.uploads.base_path.clone()),
        )
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
