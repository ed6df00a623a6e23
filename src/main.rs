//! HMS deployment entry point.
//!
//! Boots the REST server over a shared in-process store, seeding the
//! initial admin account from the environment when configured.

use hms_api_rest::{router, ApiDoc, AppState};
use hms_core::{CoreConfig, MemoryStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main entry point for the HMS application.
///
/// Starts the REST server on the configured address (default:
/// 0.0.0.0:3000) with OpenAPI/Swagger documentation mounted at
/// `/swagger-ui`.
///
/// # Environment Variables
/// - `HMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HMS_JWT_SECRET`: signing secret for bearer tokens (required,
///   minimum 16 bytes)
/// - `HMS_ADMIN_USERNAME` / `HMS_ADMIN_PASSWORD` / `HMS_ADMIN_NAME` /
///   `HMS_ADMIN_EMAIL`: optional initial admin account, seeded only when
///   a password is provided
///
/// # Returns
/// * `Ok(())` - if the server starts and runs successfully
/// * `Err(anyhow::Error)` - if startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hms=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting HMS REST on {}", rest_addr);

    let jwt_secret = std::env::var("HMS_JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("HMS_JWT_SECRET must be set"))?;
    let cfg = Arc::new(
        CoreConfig::with_defaults(jwt_secret).map_err(|e| anyhow::anyhow!("bad config: {e}"))?,
    );

    let store = Arc::new(MemoryStore::new());
    let state = AppState::assemble(store, cfg);

    seed_admin_from_env(&state);

    let app = router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seeds the first admin account from the environment when configured.
fn seed_admin_from_env(state: &AppState) {
    let Ok(password) = std::env::var("HMS_ADMIN_PASSWORD") else {
        tracing::warn!("HMS_ADMIN_PASSWORD not set; no staff accounts will exist at startup");
        return;
    };
    let username = std::env::var("HMS_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let name = std::env::var("HMS_ADMIN_NAME").unwrap_or_else(|_| "Administrator".into());
    let email =
        std::env::var("HMS_ADMIN_EMAIL").unwrap_or_else(|_| "admin@clinic.example".into());

    match state.auth.seed_admin(&username, &password, &name, &email) {
        Ok(summary) => tracing::info!(username = %summary.username, "admin account seeded"),
        Err(e) => tracing::warn!("admin seeding skipped: {e}"),
    }
}
