//! Session and route tables.
//!
//! Two maps, both owned by the engine:
//! - **sessions**: peer handle -> [`Session`], at most one per handle
//! - **routes**: address -> peer handle of the last link that proved it
//!
//! Only handshakes write to either map. Routes are last-writer-wins: when a
//! second handle proves an address already in the table, the route moves to
//! the newer handle and the older session stays in place.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

use rns_core::Address;
use rns_crypto::LinkKey;
use tracing::debug;

/// Handshake progress for one peer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No request sent and no session.
    None,
    /// LINK_REQUEST sent, waiting for LINK_PROOF.
    AwaitingProof,
    /// Session in place.
    Established,
}

/// An established link to a directly connected peer.
#[derive(Debug)]
pub struct Session {
    remote_address: Address,
    key: LinkKey,
    last_seen: Instant,
}

impl Session {
    fn new(remote_address: Address, key: LinkKey) -> Self {
        Self {
            remote_address,
            key,
            last_seen: Instant::now(),
        }
    }

    /// Address learned from the peer's handshake packet.
    pub fn remote_address(&self) -> Address {
        self.remote_address
    }

    /// Symmetric key for every packet on this link.
    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    /// Last handshake or authenticated inbound packet.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub(crate) fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

/// Why an address could not be resolved to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteError {
    /// Address never proved by any handshake.
    NoRoute,
    /// Route exists but its handle has no session for that address.
    NoSession,
}

/// Sessions, routes, and outstanding link requests.
#[derive(Debug)]
pub struct LinkTable<H> {
    sessions: HashMap<H, Session>,
    routes: HashMap<Address, H>,
    pending: HashSet<H>,
}

impl<H> Default for LinkTable<H> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            routes: HashMap::new(),
            pending: HashSet::new(),
        }
    }
}

impl<H: Clone + Eq + Hash + Debug> LinkTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a LINK_REQUEST went out to `peer`.
    ///
    /// A second call for the same handle replaces the first.
    pub(crate) fn mark_pending(&mut self, peer: H) {
        if !self.pending.insert(peer.clone()) {
            debug!(peer = ?peer, "link request re-sent before proof arrived");
        }
    }

    pub fn is_pending(&self, peer: &H) -> bool {
        self.pending.contains(peer)
    }

    /// Forget the outstanding LINK_REQUEST to `peer`, once its proof is in.
    pub(crate) fn clear_pending(&mut self, peer: &H) {
        self.pending.remove(peer);
    }

    /// Create or overwrite the session for `peer` and point `address` at it.
    ///
    /// Leaves any outstanding request to `peer` in place: answering a peer's
    /// LINK_REQUEST does not answer our own. Returns the session it
    /// replaced, if any.
    pub(crate) fn establish(
        &mut self,
        peer: H,
        address: Address,
        key: LinkKey,
    ) -> Option<Session> {
        let previous = self
            .sessions
            .insert(peer.clone(), Session::new(address, key));

        if let Some(old) = &previous {
            // Drop the old address's route if it still points here.
            if old.remote_address != address
                && self.routes.get(&old.remote_address) == Some(&peer)
            {
                self.routes.remove(&old.remote_address);
                debug!(peer = ?peer, address = %old.remote_address, "stale route removed");
            }
        }

        if let Some(displaced) = self.routes.insert(address, peer.clone()) {
            if displaced != peer {
                debug!(
                    address = %address,
                    old_peer = ?displaced,
                    new_peer = ?peer,
                    "route replaced"
                );
            }
        }

        previous
    }

    pub fn session(&self, peer: &H) -> Option<&Session> {
        self.sessions.get(peer)
    }

    pub(crate) fn session_mut(&mut self, peer: &H) -> Option<&mut Session> {
        self.sessions.get_mut(peer)
    }

    /// Handle currently bound to `address`.
    pub fn route(&self, address: &Address) -> Option<&H> {
        self.routes.get(address)
    }

    /// Resolve an address to its handle and session.
    pub(crate) fn resolve(&self, address: &Address) -> Result<(&H, &Session), RouteError> {
        let peer = self.routes.get(address).ok_or(RouteError::NoRoute)?;
        let session = self.sessions.get(peer).ok_or(RouteError::NoSession)?;

        if session.remote_address != *address {
            return Err(RouteError::NoSession);
        }

        Ok((peer, session))
    }

    pub fn state(&self, peer: &H) -> LinkState {
        if self.sessions.contains_key(peer) {
            LinkState::Established
        } else if self.pending.contains(peer) {
            LinkState::AwaitingProof
        } else {
            LinkState::None
        }
    }

    /// Number of established sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Point `address` at `peer` without a handshake.
    #[cfg(test)]
    pub(crate) fn force_route(&mut self, address: Address, peer: H) {
        self.routes.insert(address, peer);
    }
}
