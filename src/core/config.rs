//! # Service configuration.
//!
//! Provides [`Config`], the settings an [`EventService`](crate::EventService) is
//! built with.
//!
//! ## Sentinel values
//! - `coalescing_window = 0s` → flush on the next timer tick (no merging across ticks)
//! - `max_coalescing_delay = 0s` → unbounded (a steady stream keeps extending the window)
//! - both are clamped to 365 days when armed
//! - `handler_timeout = 0s` → handlers may run as long as they like

use std::time::Duration;

use crate::policies::DefaultDelivery;

/// Configuration for the dispatch service.
///
/// ## Field semantics
/// - `coalescing_window`: trailing-edge debounce for repeated reports of one code
/// - `max_coalescing_delay`: upper bound from first report to dispatch (`0s` = none)
/// - `handler_timeout`: per-invocation handler limit (`0s` = none)
/// - `bus_capacity`: monitor bus ring buffer size (min 1)
/// - `queue_capacity`: bound of the command queue into the event loop (min 1)
/// - `default_delivery`: default-category policy for reports that do not set one
///
/// ## Notes
/// All fields are public. Prefer the accessors over checking the `0` sentinels by hand.
#[derive(Clone, Debug)]
pub struct Config {
    /// Coalescing window `W`.
    ///
    /// Every merge pushes the pending flush to `now + W`. Changing it at runtime
    /// (see [`EventService::set_coalescing_window`](crate::EventService::set_coalescing_window))
    /// affects the next report or merge; armed deadlines are left alone.
    pub coalescing_window: Duration,

    /// Upper bound on how long a burst can be held back.
    ///
    /// - `Duration::ZERO` = unbounded
    /// - `> 0` = a pending event is dispatched no later than this after its first report
    pub max_coalescing_delay: Duration,

    /// Per-handler invocation timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = an invocation running longer counts as a failed handler
    pub handler_timeout: Duration,

    /// Capacity of the monitor bus broadcast channel.
    pub bus_capacity: usize,

    /// Capacity of the command queue feeding the event loop.
    ///
    /// `report_event` waits for space, `try_report_event` fails with
    /// [`EventError::QueueFull`](crate::EventError::QueueFull).
    pub queue_capacity: usize,

    /// Default-category policy used when a report does not choose one.
    pub default_delivery: DefaultDelivery,
}

impl Config {
    /// Returns the coalescing bound as an `Option`.
    #[inline]
    pub fn coalescing_limit(&self) -> Option<Duration> {
        if self.max_coalescing_delay == Duration::ZERO {
            None
        } else {
            Some(self.max_coalescing_delay)
        }
    }

    /// Returns the per-handler timeout as an `Option`.
    #[inline]
    pub fn handler_timeout(&self) -> Option<Duration> {
        if self.handler_timeout == Duration::ZERO {
            None
        } else {
            Some(self.handler_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `coalescing_window = 1s`
    /// - `max_coalescing_delay = 0s` (unbounded)
    /// - `handler_timeout = 0s` (no timeout)
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 1024`
    /// - `default_delivery = DefaultDelivery::WhenUnclaimed`
    fn default() -> Self {
        Self {
            coalescing_window: Duration::from_secs(1),
            max_coalescing_delay: Duration::ZERO,
            handler_timeout: Duration::ZERO,
            bus_capacity: 1024,
            queue_capacity: 1024,
            default_delivery: DefaultDelivery::default(),
        }
    }
}
