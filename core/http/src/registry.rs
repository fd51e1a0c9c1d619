//! The process-wide server registry: servers bind to a port and the
//! registry notifies subscribers (the service-worker bridge, §4.6) on
//! register/unregister.

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::JsValue;
use rustc_hash::FxHashMap;

use crate::error::HttpError;

/// A registered in-page server: a port and its JS `handleRequest` callable.
/// `handler` is expected to be callable with `(method, url, headers, body)`
/// and to return a `ResponseRecord`-shaped value or a promise of one.
#[derive(Clone)]
pub struct VirtualServer {
    pub port: u16,
    pub handler: JsValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered(u16),
    Unregistered(u16),
}

/// Keyed by port. Single-threaded, `Rc<RefCell<_>>`-backed like every other
/// shared structure in this system (§5: no real concurrency).
#[derive(Default)]
pub struct ServerRegistry {
    servers: RefCell<FxHashMap<u16, VirtualServer>>,
    subscribers: RefCell<Vec<Box<dyn Fn(RegistryEvent)>>>,
}

impl ServerRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Subscribes to register/unregister notifications (the bridge uses
    /// this to know which ports it should intercept).
    pub fn subscribe(&self, callback: impl Fn(RegistryEvent) + 'static) {
        self.subscribers.borrow_mut().push(Box::new(callback));
    }

    fn notify(&self, event: RegistryEvent) {
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(event);
        }
    }

    pub fn register(&self, port: u16, handler: JsValue) -> Result<(), HttpError> {
        if self.servers.borrow().contains_key(&port) {
            return Err(HttpError::PortInUse(port));
        }
        self.servers.borrow_mut().insert(port, VirtualServer { port, handler });
        self.notify(RegistryEvent::Registered(port));
        Ok(())
    }

    pub fn unregister(&self, port: u16) -> Result<(), HttpError> {
        if self.servers.borrow_mut().remove(&port).is_none() {
            return Err(HttpError::NoServerForPort(port));
        }
        self.notify(RegistryEvent::Unregistered(port));
        Ok(())
    }

    pub fn get(&self, port: u16) -> Option<VirtualServer> {
        self.servers.borrow().get(&port).cloned()
    }

    pub fn is_registered(&self, port: u16) -> bool {
        self.servers.borrow().contains_key(&port)
    }
}
