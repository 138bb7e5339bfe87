use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use super::{
    cache::EventCache,
    chain::Dispatcher,
    config::Config,
    event_loop::EventLoop,
    handle::EventHandle,
    service::EventService,
};
use crate::{error::EventError, handlers::HandlerSpec, monitor::Bus, registry::Registry};

/// Builder for an [`EventService`].
pub struct EventServiceBuilder {
    cfg: Config,
    handlers: Vec<HandlerSpec>,
    bus: Option<Bus>,
}

impl EventServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            handlers: Vec::new(),
            bus: None,
        }
    }

    /// Registers `spec` before the event loop starts.
    pub fn with_handler(mut self, spec: HandlerSpec) -> Self {
        self.handlers.push(spec);
        self
    }

    /// Registers every spec before the event loop starts, in order.
    pub fn with_handlers(mut self, specs: impl IntoIterator<Item = HandlerSpec>) -> Self {
        self.handlers.extend(specs);
        self
    }

    /// Publishes monitor events on an existing bus instead of a fresh one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Registers the initial handlers and spawns the event loop.
    ///
    /// Must be called from inside a tokio runtime. Fails with
    /// [`EventError::DuplicateName`] if two initial handlers share a name.
    pub fn build(self) -> Result<Arc<EventService>, EventError> {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));

        let mut registry = Registry::new();
        for spec in self.handlers {
            registry.register(spec)?;
        }
        let registry = Arc::new(RwLock::new(registry));

        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(self.cfg.queue_capacity_clamped());

        let cache = EventCache::new(self.cfg.coalescing_window, self.cfg.coalescing_limit());
        let dispatcher = Dispatcher {
            registry: Arc::clone(&registry),
            bus: bus.clone(),
            handler_timeout: self.cfg.handler_timeout(),
            default_delivery: self.cfg.default_delivery,
        };
        let worker = tokio::spawn(EventLoop::new(cache, rx, dispatcher, token.clone()).run());

        Ok(Arc::new(EventService::new_internal(
            self.cfg,
            bus,
            registry,
            EventHandle::new(tx, token.clone()),
            token,
            worker,
        )))
    }
}
