use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::{application::ports::clock::Clock, use_cases::subscription_sweep::SweepUseCases};

/// Runs the lifecycle sweep on a fixed ticker. The HTTP trigger stays
/// available alongside it; the sweep is idempotent.
pub async fn run_sweep_loop(sweep: Arc<SweepUseCases>, clock: Arc<dyn Clock>, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Subscription sweep started (every {}s)", interval_secs);

    loop {
        ticker.tick().await;

        if let Err(e) = sweep.run(clock.now()).await {
            error!(error = ?e, "Subscription sweep failed");
        }
    }
}
