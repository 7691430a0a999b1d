//! The gRPC front end. Holds the [`RegistryStore`] capability abstraction,
//! never a concrete store, so the same service works unmodified against
//! either the in-memory or the SQLite-backed variant.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use registry_core::{BufferLocation, Filter, RegItem, RegistryError, RegistryStore};

use crate::proto::registry_server::Registry;
use crate::proto::{
    AddCallbackRequest, ComMsg, FilterMsg, LookupReply, RegItemMsg, RemoveCallbackRequest, ResultMsg,
};

pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

fn to_reg_item(msg: &RegItemMsg) -> std::result::Result<RegItem, Status> {
    if msg.owner.is_empty() || msg.location_name.len() <= 1 {
        return Err(Status::invalid_argument(
            "owner must be non-empty and location name must be >1 byte",
        ));
    }
    Ok(RegItem::new(msg.owner.clone(), BufferLocation::near(msg.location_name.clone())))
}

fn store_error_to_status(err: RegistryError) -> Status {
    match err {
        RegistryError::StorageFault(msg) => Status::internal(msg),
        RegistryError::BadArgument(msg) => Status::invalid_argument(msg),
    }
}

#[tonic::async_trait]
impl Registry for RegistryService {
    async fn register(&self, request: Request<ComMsg>) -> std::result::Result<Response<ResultMsg>, Status> {
        let items = request.into_inner().reg_item;
        if items.is_empty() {
            return Err(Status::invalid_argument("register requires at least one item"));
        }
        for msg in &items {
            let ri = to_reg_item(msg)?;
            self.store.register(ri).map_err(store_error_to_status)?;
        }
        Ok(Response::new(ResultMsg {
            code: 0,
            error_message: String::new(),
            reg_item: Vec::new(),
        }))
    }

    async fn unregister(
        &self,
        request: Request<ComMsg>,
    ) -> std::result::Result<Response<ResultMsg>, Status> {
        let items = request.into_inner().reg_item;
        if items.is_empty() {
            return Err(Status::invalid_argument("unregister requires at least one item"));
        }
        for msg in &items {
            let ri = to_reg_item(msg)?;
            self.store.unregister(ri).map_err(store_error_to_status)?;
        }
        Ok(Response::new(ResultMsg {
            code: 0,
            error_message: String::new(),
            reg_item: Vec::new(),
        }))
    }

    async fn lookup(
        &self,
        request: Request<FilterMsg>,
    ) -> std::result::Result<Response<LookupReply>, Status> {
        let filter = Filter::new(request.into_inner().definition);
        let items = self.store.lookup(&filter).map_err(store_error_to_status)?;
        let items: Vec<RegItemMsg> = items
            .into_iter()
            .map(|ri| RegItemMsg {
                owner: ri.owner().to_string(),
                location_name: ri.location().name().to_string(),
            })
            .collect();
        Ok(Response::new(LookupReply {
            count: items.len() as u32,
            items,
        }))
    }

    async fn add_callback(
        &self,
        _request: Request<AddCallbackRequest>,
    ) -> std::result::Result<Response<ResultMsg>, Status> {
        Err(Status::unimplemented(
            "change-notification callbacks are not yet supported over RPC",
        ))
    }

    async fn remove_callback(
        &self,
        _request: Request<RemoveCallbackRequest>,
    ) -> std::result::Result<Response<ResultMsg>, Status> {
        Err(Status::unimplemented(
            "change-notification callbacks are not yet supported over RPC",
        ))
    }
}
