use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hostelpay::Service;
use hostelpay::api;
use hostelpay::catalog::Catalog;
use hostelpay::config::Config;
use hostelpay::gateway::SandboxProvider;
use hostelpay::notify::{Dispatcher, TracingNotifier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().expect("invalid configuration");

    let catalog = Catalog::load(&config.catalog_path).expect("failed to load hostel catalog");
    if catalog.is_empty() {
        warn!(path = %config.catalog_path.display(), "hostel catalog is empty");
    }
    info!(hostels = catalog.len(), "catalog loaded");

    let notifications = Dispatcher::spawn(TracingNotifier);
    let service = Arc::new(Service::new(
        catalog,
        SandboxProvider::instant_settling(),
        &config,
        notifications,
    ));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind listener");
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, api::router(service))
        .await
        .expect("server error");
}
