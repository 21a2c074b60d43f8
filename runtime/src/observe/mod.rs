//! Per-session network observation.

pub mod network;
pub mod recorder;

pub use network::{NetworkObserver, ObservedDomains};
pub use recorder::{NetworkRecorder, RequestEvent};
