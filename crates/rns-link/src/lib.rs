//! RNS link engine.
//!
//! One [`Engine`] per local identity. It runs the two-message link handshake
//! with directly connected peers, keeps the session and route tables, and
//! seals or opens DATA packets over established links.
//!
//! The engine is transport-agnostic and has no clock or timers of its own:
//! the host supplies a [`Transport`] for outbound packets and feeds every
//! inbound packet to [`Engine::on_packet`].
//!
//! ```ignore
//! let mut engine = Engine::new(transport);
//! engine.on_message(|source, payload| println!("{source}: {payload:?}"));
//! engine.connect(peer_handle);
//! // ... transport delivers the proof via engine.on_packet(peer_handle, bytes)
//! engine.send_text(&peer_address, "hello")?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod table;
pub mod transport;

pub use config::EngineConfig;
pub use engine::{DropReason, Engine, Inbound, MessageHandler};
pub use error::LinkError;
pub use table::{LinkState, Session};
pub use transport::Transport;

pub use rns_core::Address;
pub use rns_crypto::IdentityKeypair;
