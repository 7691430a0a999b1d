//! Errors surfaced by the Spring/Extractor facades.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no channel named {channel:?} registered under owner {owner:?}")]
    ChannelNotFound { owner: String, channel: String },

    #[error(transparent)]
    Ring(#[from] msgbus_ring::RingError),

    #[error(transparent)]
    Client(#[from] registry_rpc::ClientError),
}

pub type Result<T> = std::result::Result<T, BusError>;
