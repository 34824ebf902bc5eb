//! Campora API composition root.

#![forbid(unsafe_code)]

mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use campora_application::{
    AssignmentService, CatalogService, PermissionResolver, ResolutionCache, RoleGraphService,
    TemplateService,
};
use campora_core::AppError;
use campora_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditRepository, PostgresCatalogRepository,
    PostgresRoleRepository, PostgresTemplateRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = env::args().nth(1);
    let migrate_only = command.as_deref() == Some("migrate");
    let seed_only = command.as_deref() == Some("seed");

    let database_url = required_env("DATABASE_URL")?;
    let api_token = required_env("API_TOKEN")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let catalog_repository = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let assignment_repository = Arc::new(PostgresAssignmentRepository::new(pool.clone()));
    let template_repository = Arc::new(PostgresTemplateRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    // One cache shared by every service so an invalidation in one is
    // visible to all of them.
    let cache = ResolutionCache::default();

    let role_service = RoleGraphService::new(
        role_repository.clone(),
        catalog_repository.clone(),
        cache.clone(),
        audit_repository.clone(),
    );

    let app_state = AppState {
        catalog_service: CatalogService::new(catalog_repository),
        role_service: role_service.clone(),
        assignment_service: AssignmentService::new(
            assignment_repository.clone(),
            role_repository.clone(),
            cache.clone(),
            audit_repository.clone(),
        ),
        template_service: TemplateService::new(
            template_repository,
            role_repository,
            assignment_repository.clone(),
            cache.clone(),
            audit_repository,
        ),
        resolver: PermissionResolver::new(assignment_repository, role_service, cache),
        api_token,
    };

    if seed_only {
        dev_seed::run(&app_state).await?;
        return Ok(());
    }

    let protected_routes = Router::new()
        .route(
            "/api/modules",
            get(handlers::catalog::list_modules_handler)
                .post(handlers::catalog::create_module_handler),
        )
        .route(
            "/api/permissions",
            get(handlers::catalog::list_permissions_handler)
                .post(handlers::catalog::create_permission_handler),
        )
        .route(
            "/api/permissions/bulk",
            post(handlers::catalog::seed_permissions_handler),
        )
        .route(
            "/api/permissions/check",
            post(handlers::resolution::check_permission_handler),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}/parent",
            put(handlers::roles::set_parent_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(handlers::roles::role_permissions_handler)
                .post(handlers::roles::bulk_grant_handler)
                .delete(handlers::roles::revoke_grant_handler),
        )
        .route(
            "/api/assignments",
            post(handlers::assignments::assign_role_handler)
                .delete(handlers::assignments::remove_assignment_handler),
        )
        .route(
            "/api/users/{user_id}/assignments",
            get(handlers::assignments::list_user_assignments_handler),
        )
        .route(
            "/api/users/{user_id}/permissions",
            get(handlers::resolution::user_permissions_handler),
        )
        .route(
            "/api/templates",
            get(handlers::templates::list_templates_handler),
        )
        .route(
            "/api/templates/{template_id}/entries",
            get(handlers::templates::list_template_entries_handler),
        )
        .route(
            "/api/templates/{template_id}/apply",
            post(handlers::templates::apply_template_handler),
        )
        .route(
            "/api/templates/{template_id}/apply-batch",
            post(handlers::templates::apply_template_batch_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_identity,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&frontend_url)?)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "campora-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = HeaderValue::from_str(frontend_url)
        .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?;

    // Browser preflights must clear both the JSON body header and the
    // identity headers checked by `middleware::require_identity`.
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(middleware::API_TOKEN_HEADER),
            HeaderName::from_static(middleware::USER_ID_HEADER),
            HeaderName::from_static(middleware::USER_NAME_HEADER),
            HeaderName::from_static(middleware::USER_EMAIL_HEADER),
        ]))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
