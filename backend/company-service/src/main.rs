use actix_cors::Cors;
use actix_web::{App, HttpServer};
use anyhow::Context;
use company_service::db::{CompanyRepository, InMemoryCompanyRepository, PgCompanyRepository};
use company_service::openapi::ApiDoc;
use company_service::services::{bootstrap, CompanyService};
use company_service::{configure, AppState, Config};
use crypto_core::{keys, TokenIssuer, TokenVerifier};
use db_pool::{create_pool, DbConfig};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const SERVICE_NAME: &str = "company-service";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,actix_web=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_repository() -> anyhow::Result<Arc<dyn CompanyRepository>> {
    let Some(db_config) = DbConfig::from_env(SERVICE_NAME) else {
        tracing::warn!("DATABASE_URL not set; companies are kept in memory only");
        return Ok(Arc::new(InMemoryCompanyRepository::new()));
    };

    db_config.log_config();
    let pool = create_pool(db_config)
        .await
        .context("Failed to create database pool")?;

    let repo = PgCompanyRepository::new(pool);
    repo.ensure_schema()
        .await
        .context("Failed to prepare companies schema")?;

    Ok(Arc::new(repo))
}

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin.is_empty() {
            continue;
        }
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let key_pair = keys::provision(&config.jwt.key_config())
        .context("Failed to provision RSA key pair")?;
    let issuer = TokenIssuer::new(&key_pair, config.jwt.token_ttl())
        .context("Failed to initialize token issuer")?;
    let verifier =
        TokenVerifier::new(&key_pair).context("Failed to initialize token verifier")?;

    let companies = CompanyService::new(build_repository().await?);
    if config.initial_load {
        bootstrap::seed_default_companies(&companies)
            .await
            .context("Failed to load default companies")?;
    }

    if config.jwt.auth_endpoint_enabled {
        tracing::warn!("POST /api/auth is enabled; anyone can mint tokens");
    }

    let state = AppState::new(companies, issuer, verifier, config.jwt.auth_endpoint_enabled);
    let allowed_origins = config.cors.allowed_origins.clone();
    let bind_address = (config.app.host.clone(), config.app.port);

    tracing::info!("Starting HTTP server at {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&allowed_origins))
            .wrap(actix_middleware::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| configure(cfg, &state))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()))
    })
    .bind(bind_address)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("{} stopped", SERVICE_NAME);
    Ok(())
}
