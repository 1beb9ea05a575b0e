//! Transport boundary.
//!
//! The engine never opens connections. Whatever moves bytes between directly
//! reachable peers (a data channel, a socket pair, an in-process queue)
//! implements [`Transport`] for outbound packets and calls
//! [`Engine::on_packet`](crate::Engine::on_packet) for every inbound one.
//! Each call carries exactly one packet; framing over byte streams is the
//! transport's job.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use bytes::Bytes;

/// Outbound half of a packet transport.
pub trait Transport {
    /// Opaque identifier for a directly reachable peer.
    type Handle: Clone + Eq + Hash + Debug;

    /// Queue `packet` for delivery to `peer`.
    ///
    /// Fire-and-forget: the engine assumes nothing about delivery and
    /// expects no error. A handle the transport no longer knows is the
    /// transport's to drop.
    fn send(&self, peer: &Self::Handle, packet: Bytes);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Handle = T::Handle;

    fn send(&self, peer: &Self::Handle, packet: Bytes) {
        (**self).send(peer, packet)
    }
}
