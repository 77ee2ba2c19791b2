//! Engine-independent core of the memory garden.
//!
//! Journal entries ("memories") grow as trees in eight emotion-themed zones
//! arranged in a ring. This crate provides:
//! - The zone table and an engine-neutral scene description
//! - Procedural decorations, memory trees and the scene layout
//! - The per-frame interaction loop (movement, picking, dragging, zones)
//! - The session memory store and thematic connections
//! - An AI gateway for sentiment tagging, completion and relatedness
//! - Ambient zone tones
//!
//! # Quick Start
//!
//! ```ignore
//! use garden_core::{GardenConfig, GardenSession, MemoryDraft};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut session = GardenSession::create(GardenConfig::from_env()?, 42);
//!
//! let id = session.plant(
//!     MemoryDraft::new("First snow", "We built a lopsided snowman").with_emotion("joy"),
//!     runtime.handle(),
//! )?;
//!
//! for tree in session.tree_groups() {
//!     println!("{:?} at {}", tree.tag, tree.translation);
//! }
//! ```

pub mod audio;
pub mod color;
pub mod config;
pub mod gateway;
pub mod geometry;
pub mod interaction;
pub mod memory;
pub mod scene;
pub mod session;
pub mod store;
pub mod testing;
pub mod zone;

// Primary public API
pub use audio::{AmbientMixer, ToneSpec, VoiceId, Waveform};
pub use color::Rgb;
pub use config::{ConfigError, GardenConfig};
pub use gateway::{AiGateway, ChatRequest, CompletionBackend, GatewayError, PendingRequest};
pub use interaction::{determine_zone, AmbientEffect, GardenEvent, MoveKey};
pub use memory::{GroundPosition, Memory, MemoryDraft, MemoryError, MemoryId};
pub use scene::{GroupTag, MeshGroup, Scene};
pub use session::GardenSession;
pub use store::{ConnectionSegment, Connections, MemoryStore};
pub use testing::MockBackend;
pub use zone::{lookup, Emotion, Zone};
