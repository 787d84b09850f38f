use dotenvy::dotenv;
use tracing::info;

use std::net::SocketAddr;
use whatsou::infra::{
    app::create_app, error::InfraError, setup::init_app_state, sweep_worker::run_sweep_loop,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    // Spawned after create_app so the loop logs through the subscriber.
    if let Some(interval_secs) = app_state.config.sweep_interval_secs {
        let sweep = app_state.sweep_use_cases.clone();
        let clock = app_state.clock.clone();
        tokio::spawn(async move {
            run_sweep_loop(sweep, clock, interval_secs).await;
        });
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(InfraError::TcpBind)?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(InfraError::Server)?;

    Ok(())
}
