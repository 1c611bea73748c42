//! Broker admin entry-point: loads settings, wires adapters and serves the
//! admin API.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[cfg(feature = "demo-data")]
use broker_admin::demo_data::{DemoDataSettings, seed_demo_data_on_startup};
use broker_admin::inbound::http::health::HealthState;
use broker_admin::settings::{AdminSettings, BuildMode};

use server::{ServerConfig, build_http_state, build_ports, create_server};

#[cfg(feature = "demo-data")]
fn seed_demo_data(
    store: Option<&broker_admin::outbound::memory_store::InMemoryRemoteStore>,
) -> io::Result<()> {
    let program = std::env::args_os().next().unwrap_or_default();
    let settings = DemoDataSettings::load_from_iter([program])
        .map_err(|err| io::Error::other(format!("failed to load demo data settings: {err}")))?;
    seed_demo_data_on_startup(&settings, store)
        .map_err(|err| io::Error::other(err.to_string()))?;
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AdminSettings::load()
        .map_err(|err| io::Error::other(format!("failed to load settings: {err}")))?;
    let session = settings
        .session(BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    let ports = build_ports(&settings)?;
    #[cfg(feature = "demo-data")]
    seed_demo_data(ports.memory.as_ref())?;
    let state = build_http_state(&settings, &ports)?;

    let config =
        ServerConfig::new(session, bind_addr).with_session_ttl(settings.session_max_age_minutes);
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, state.http_state, config)?;
    info!(%bind_addr, "broker admin listening");

    let outcome = server.await;
    state.live_updates.unsubscribe();
    outcome
}
