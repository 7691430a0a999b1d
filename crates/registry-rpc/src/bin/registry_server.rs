//! Registry server CLI: binds a [`registry_rpc::RegistryService`] and
//! serves it until terminated.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use registry_core::{InMemoryStore, RegistryStore, SqliteStore};
use registry_rpc::proto::registry_server::RegistryServer;
use registry_rpc::RegistryService;
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;

#[derive(Parser, Debug)]
#[command(about = "Serves the registry over gRPC")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    ip: IpAddr,

    #[arg(long, default_value_t = 40040)]
    port: u16,

    /// Path to a SQLite database file. When omitted, the server holds
    /// state in memory only and loses it on restart.
    #[arg(long)]
    store_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.ip, args.port);

    let store: Arc<dyn RegistryStore> = match &args.store_path {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(InMemoryStore::new()),
    };

    tracing::info!(%addr, persistent = args.store_path.is_some(), "starting registry server");

    let service = RegistryServer::new(RegistryService::new(store))
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Gzip);

    Server::builder().add_service(service).serve(addr).await?;
    Ok(())
}
