//! The code deployed on the bridge's chain, by address.
//!
//! The proxy only ever stores an address for its logic module. Whatever is executable at that
//! address is looked up here on every call, in the same way routers are looked up when a message
//! is forwarded.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;

use crate::{forwarder::Router, proxy::LogicModule};

#[derive(Debug, Clone)]
pub enum Code {
    Module(Arc<dyn LogicModule>),
    Router(Arc<dyn Router>),
}

#[derive(Debug, Default, Clone)]
pub struct Host {
    code: HashMap<Address, Code>,
}

impl Host {
    pub fn new() -> Host {
        Host::default()
    }

    /// Replaces any code already deployed at `address`.
    pub fn deploy_module(&mut self, address: Address, module: Arc<dyn LogicModule>) {
        self.code.insert(address, Code::Module(module));
    }

    /// Replaces any code already deployed at `address`.
    pub fn deploy_router(&mut self, address: Address, router: Arc<dyn Router>) {
        self.code.insert(address, Code::Router(router));
    }

    pub fn has_code(&self, address: &Address) -> bool {
        self.code.contains_key(address)
    }

    pub fn module(&self, address: &Address) -> Option<Arc<dyn LogicModule>> {
        match self.code.get(address)? {
            Code::Module(module) => Some(Arc::clone(module)),
            Code::Router(_) => None,
        }
    }

    pub fn router(&self, address: &Address) -> Option<Arc<dyn Router>> {
        match self.code.get(address)? {
            Code::Router(router) => Some(Arc::clone(router)),
            Code::Module(_) => None,
        }
    }
}
