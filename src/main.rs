use clap::Parser;
use swarm_tracker::bootstrap::config::Args;
use swarm_tracker::{app, bootstrap};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (config, container) = bootstrap::app::setup(&args).await;

    let jobs = app::start(&config, &container).await;

    bootstrap::jobs::signals::wait_for_shutdown(&container, jobs).await;
}
