//! [`Spring`]: a publisher's handle onto a named shared-memory channel,
//! advertised to the registry under its owner.

use msgbus_ring::{Record, Ring};
use registry_core::BufferLocation;
use registry_rpc::SpringRegistryClient;

use crate::error::Result;

fn ring_name(owner: &str, channel: &str) -> String {
    format!("{owner}_{channel}")
}

pub struct Spring {
    ring: Ring,
    registry: SpringRegistryClient,
    location: BufferLocation,
}

impl Spring {
    /// Publishes `{owner, channel}` to the registry, then creates the
    /// backing ring. `elem_size` must equal [`RECORD_SIZE`]; passing
    /// anything else surfaces [`msgbus_ring::RingError::ElemSizeMismatch`].
    pub async fn new(
        owner: &str,
        channel: &str,
        capacity: usize,
        elem_size: usize,
        registry_endpoint: impl Into<String>,
    ) -> Result<Self> {
        let name = ring_name(owner, channel);
        let mut registry = SpringRegistryClient::connect(owner, registry_endpoint).await?;
        let location = BufferLocation::near(channel.to_string());
        registry.publish(location.clone()).await?;
        let ring = Ring::create(&name, capacity, elem_size)?;
        Ok(Self {
            ring,
            registry,
            location,
        })
    }

    /// Enqueues `data` (truncated to 127 bytes plus a NUL terminator)
    /// tagged with `id`. Returns `false` if the ring is full; callers
    /// decide whether to drop or retry.
    pub fn push(&self, data: &[u8], id: u64) -> bool {
        let record = Record::new(id, data);
        self.ring.enqueue(&record)
    }

    pub async fn unpublish(&mut self) -> Result<()> {
        self.registry.unpublish(self.location.clone()).await?;
        Ok(())
    }
}
