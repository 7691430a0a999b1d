//! Typed facades over the generated gRPC client (C4), used by publishers
//! ([`SpringRegistryClient`]) and consumers ([`ExtractorRegistryClient`]).

use registry_core::{BufferLocation, Filter, RegItem};
use tonic::transport::Channel;

use crate::error::{ClientError, Result};
use crate::proto::registry_client::RegistryClient;
use crate::proto::{ComMsg, FilterMsg, RegItemMsg};

fn to_msg(owner: &str, location: &BufferLocation) -> RegItemMsg {
    RegItemMsg {
        owner: owner.to_string(),
        location_name: location.name().to_string(),
    }
}

/// A publisher's view of the registry: bound to a single `owner` and
/// endpoint, it sends single-item Register/Unregister RPCs.
pub struct SpringRegistryClient {
    owner: String,
    inner: RegistryClient<Channel>,
}

impl SpringRegistryClient {
    pub async fn connect(owner: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let inner = RegistryClient::connect(endpoint.into()).await?;
        Ok(Self {
            owner: owner.into(),
            inner,
        })
    }

    pub async fn publish(&mut self, location: BufferLocation) -> Result<()> {
        let msg = ComMsg {
            reg_item: vec![to_msg(&self.owner, &location)],
        };
        self.inner
            .register(msg)
            .await
            .map_err(|status| ClientError::RegistrationFailed(status.message().to_string()))?;
        Ok(())
    }

    pub async fn unpublish(&mut self, location: BufferLocation) -> Result<()> {
        let msg = ComMsg {
            reg_item: vec![to_msg(&self.owner, &location)],
        };
        self.inner
            .unregister(msg)
            .await
            .map_err(|status| ClientError::UnregistrationFailed(status.message().to_string()))?;
        Ok(())
    }
}

/// A consumer's view of the registry: not bound to an owner, it looks up
/// publishers by substring filter.
pub struct ExtractorRegistryClient {
    inner: RegistryClient<Channel>,
}

impl ExtractorRegistryClient {
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let inner = RegistryClient::connect(endpoint.into()).await?;
        Ok(Self { inner })
    }

    pub async fn lookup(&mut self, filter: &Filter) -> Result<Vec<RegItem>> {
        let reply = self
            .inner
            .lookup(FilterMsg {
                definition: filter.text().to_string(),
            })
            .await
            .map_err(|status| ClientError::LookupFailed(status.message().to_string()))?
            .into_inner();
        Ok(reply
            .items
            .into_iter()
            .map(|msg| RegItem::new(msg.owner, BufferLocation::near(msg.location_name)))
            .collect())
    }

    /// Reserved placeholder: change-notification callbacks are not yet
    /// wired up end-to-end over RPC (see [`crate::server::RegistryService`]'s
    /// `add_callback`/`remove_callback`). Calling this does nothing.
    pub fn register_callback(&self, _filter: Filter, _cb: Box<dyn Fn(&[RegItem]) + Send + Sync>) {}
}
