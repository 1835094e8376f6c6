//! Session lifecycle events.
//!
//! The [`SessionManager`](crate::SessionManager) emits an event for every
//! state change. Events go to the [`EventRegistry`] the manager was built
//! with; without one they are dropped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskboard_session::events::{EventRegistry, listeners::TracingListener};
//!
//! let mut registry = EventRegistry::new();
//! registry.listen(TracingListener);
//!
//! let manager = SessionManager::new(store, gateway).with_events(Arc::new(registry));
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use taskboard_session::events::{SessionEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct FailedLoginCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Listener for FailedLoginCounter {
//!     async fn handle(&self, event: &SessionEvent) {
//!         if let SessionEvent::LoginFailed { .. } = event {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::SessionEvent;
pub use listener::Listener;
pub use registry::EventRegistry;
