use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use mediaadapters::{Adapters, GatewayConfig};
use mediaruntime::{AdapterRegistry, MediaRuntime, RuntimeConfig};
use mediaserver::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚀 Starting media gateway");

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let adapters = Adapters::from_config(&config)?;
    adapters
        .store
        .ensure_dirs()
        .await
        .with_context(|| format!("creating media directories under {}", config.media_root.display()))?;

    let mut registry = AdapterRegistry::new();
    mediaadapters::register_all(&mut registry, &adapters);
    let kinds: Vec<&str> = registry.list_kinds().iter().map(|k| k.as_str()).collect();
    info!("✅ Adapters registered: {}", kinds.join(", "));
    let runtime = MediaRuntime::with_registry(Arc::new(registry), RuntimeConfig::default());

    info!("✅ Runtime initialized, media root {}", adapters.store.root().display());

    let app_state = web::Data::new(AppState::new(Arc::new(runtime), adapters));
    let bind_address = config.bind_address.clone();

    info!("🌐 Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(mediaserver::configure)
            .default_service(web::to(mediaserver::route_not_found))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
