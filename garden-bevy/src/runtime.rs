//! Shared tokio runtime for AI requests.
//!
//! Gateway calls are spawned here and polled from Bevy systems through
//! `PendingRequest` handles, so the frame loop never blocks on the network.

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

/// Global runtime for all gateway requests.
pub static RUNTIME: Lazy<Runtime> =
    Lazy::new(|| Runtime::new().expect("Failed to create tokio runtime"));
