//! Browsing-context pool for page sessions.

pub mod manager;

pub use manager::{ContextHandle, PoolManager};
