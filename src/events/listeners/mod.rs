//! Built-in event listeners.

mod tracing;

pub use self::tracing::TracingListener;
