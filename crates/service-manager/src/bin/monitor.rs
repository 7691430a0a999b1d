//! `monitor <executable_path> [args...]`: runs a [`ServiceManager`] over
//! the given executable until interrupted.

use std::sync::Arc;

use clap::Parser;
use service_manager::{install_sigint_handler, ServiceManager};

#[derive(Parser, Debug)]
#[command(about = "Supervises a child process, restarting it on unclean exit")]
struct Args {
    executable_path: String,
    args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Args::parse();
    let manager = Arc::new(ServiceManager::new(cli.executable_path, cli.args));

    install_sigint_handler(Arc::clone(&manager)).expect("failed to install SIGINT handler");

    manager.start();
    manager.wait();
}
