//! [`Extractor`]: a consumer's handle onto a named shared-memory channel,
//! discovered by looking up its owner in the registry.

use msgbus_ring::{Record, Ring};
use registry_core::Filter;
use registry_rpc::ExtractorRegistryClient;

use crate::error::{BusError, Result};

#[derive(Debug)]
pub struct Extractor {
    ring: Ring,
}

impl Extractor {
    /// Looks up `owner`, finds the item whose location name equals
    /// `channel`, and attaches to its ring. Fails with
    /// [`BusError::ChannelNotFound`] if `owner` published nothing under
    /// that name.
    pub async fn new(owner: &str, channel: &str, registry_endpoint: impl Into<String>) -> Result<Self> {
        let mut registry = ExtractorRegistryClient::connect(registry_endpoint).await?;
        let items = registry.lookup(&Filter::new(owner)).await?;
        let found = items.iter().any(|item| item.location().name() == channel);
        if !found {
            return Err(BusError::ChannelNotFound {
                owner: owner.to_string(),
                channel: channel.to_string(),
            });
        }
        let ring_name = format!("{owner}_{channel}");
        let ring = Ring::attach(&ring_name)?;
        Ok(Self { ring })
    }

    /// Dequeues the next record, or `None` if the ring is empty.
    pub fn pop(&self) -> Option<Record> {
        self.ring.dequeue()
    }
}
