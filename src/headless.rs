//! Terminal-less monitoring loop: alerts go to stdout or the alert file.

use std::{io, sync::Arc};

use color_eyre::Result;
use log::*;
use tokio::{signal, time};

use crate::{
    config::WatchConfig,
    watch::{SysinfoLookup, SysinfoSource, Watcher, WriterSink, source::configured_sink},
};

pub async fn run(config: WatchConfig) -> Result<()> {
    let mut watcher = Watcher::new(&config);
    watcher.init(
        Box::new(SysinfoSource::new()),
        Arc::new(SysinfoLookup::new()),
        configured_sink(&config.reporting, Box::new(WriterSink::new(io::stdout())))?,
    );

    let mut sample = time::interval(config.schedule.sample_interval());
    let mut report = time::interval(config.schedule.report_every());
    // skip the immediate first report; there is nothing to say yet
    report.tick().await;

    info!(
        target: "Watch",
        "Sampling every {:?}, reporting every {:?}",
        config.schedule.sample_interval(),
        config.schedule.report_every()
    );
    loop {
        tokio::select! {
            _ = sample.tick() => match watcher.check_processes(None).await {
                Ok(Some(summary)) => debug!(target: "Watch", "{:?}", summary),
                Ok(None) => {}
                Err(e) => error!(target: "Watch", "Detection cycle failed: {}", e),
            },
            _ = report.tick() => {
                let outcome = watcher.report(None);
                info!(target: "Report", "{}", outcome.headline());
            }
            _ = signal::ctrl_c() => {
                info!(target: "Watch", "Interrupted, stopping");
                break;
            }
        }
    }
    Ok(())
}
