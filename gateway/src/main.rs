use std::error::Error;
use std::sync::Arc;

use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod cli;
mod distributor;

use gateway_poll as poll;
use gateway_util as util;
use gateway_vdev as vdev;

use crate::distributor::LoggingDistributor;
use crate::poll::{DevicePoller, ParallelExecutor, PollerConfig};
use crate::util::dirs::vdev_config_path;
use crate::vdev::VirtualDeviceManager;

fn initialize_tracing() {
    // Initialize tracing subscriber for human-readable logs
    tracing_subscriber::registry()
        .with(
            // Use some log defaults. These can be overriden using
            // RUST_LOG
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    initialize_tracing();

    let cli = cli::parse();

    let mut config = PollerConfig::default();
    if let Some(threshold) = cli.poll_warn_threshold {
        config.warn_threshold = threshold;
    }

    let poller = DevicePoller::new(
        Arc::new(LoggingDistributor),
        Arc::new(ParallelExecutor::new(cli.poll_concurrency)),
    )
    .with_config(config);

    let poll_loop = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.run().await })
    };

    let manager = VirtualDeviceManager::new(poller.clone());
    let vdev_config = cli.vdev_config.unwrap_or_else(vdev_config_path);
    debug!(path = %vdev_config.display(), "loading virtual devices");
    manager.load_file(&vdev_config).await?;
    manager.start();

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    manager.stop();
    poller.stop();
    poll_loop.await?;
    poller.cleanup();

    Ok(())
}
