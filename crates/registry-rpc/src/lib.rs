//! registry-rpc: a gzip-compressed gRPC front end for `registry-core`,
//! plus typed client stubs for publishers and consumers.

pub mod proto {
    tonic::include_proto!("registry");
}

mod client;
mod error;
mod server;

pub use client::{ExtractorRegistryClient, SpringRegistryClient};
pub use error::{ClientError, Result};
pub use server::RegistryService;
