//! The link engine.
//!
//! # Handshake Flow
//!
//! ```text
//! Initiator                                   Responder
//!     |                                           |
//!     |  LINK_REQUEST (pk_i, nonce)               |
//!     |------------------------------------------>|  key = DH(sk_r, pk_i)
//!     |                                           |  session(handle_i) = key
//!     |  LINK_PROOF (pk_r, nonce, seal(pk_r))     |
//!     |<------------------------------------------|
//!     |  key = DH(sk_i, pk_r)                     |
//!     |  open(seal(pk_r)) ok -> session = key     |
//!     |                                           |
//!     [        DATA packets under key             ]
//! ```
//!
//! The responder seals its proof with the nonce the initiator chose, and is
//! established as soon as the proof is sent. The initiator is established
//! only once the proof authenticates.

use bytes::Bytes;
use rns_common::helpers::constant_time_eq;
use rns_core::{Address, DataPacket, LinkProof, LinkRequest, Packet, WireError};
use rns_crypto::{derive_address, random_nonce, IdentityKeypair, LinkKey};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::LinkError;
use crate::table::{LinkState, LinkTable, RouteError, Session};
use crate::transport::Transport;

/// Callback for decrypted inbound messages: `(source address, payload)`.
pub type MessageHandler = Box<dyn FnMut(Address, Bytes) + Send>;

/// What an inbound packet did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Answered a LINK_REQUEST; a session now exists for the sender.
    LinkRequested { address: Address },
    /// A LINK_PROOF authenticated; a session now exists for the sender.
    LinkEstablished { address: Address },
    /// A DATA packet was decrypted and handed to the message handler.
    Delivered {
        /// Address of the session the packet arrived on.
        source: Address,
        /// Address the sender sealed the packet for.
        destination: Address,
        payload: Bytes,
    },
    /// A DATA packet was discarded without error.
    Dropped(DropReason),
    /// Packet type this engine does not know.
    Ignored { packet_type: u8 },
}

/// Reasons a DATA packet is discarded silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No session for the handle it arrived on.
    NoSession,
    /// Ciphertext failed authentication.
    DecryptionFailed,
}

/// Protocol engine for one local identity.
///
/// All state changes happen inside [`connect`](Self::connect),
/// [`send_message`](Self::send_message) and [`on_packet`](Self::on_packet),
/// which take `&mut self`. A host delivering packets from several threads
/// must serialize calls, e.g. by owning the engine in a single task.
pub struct Engine<T: Transport> {
    identity: IdentityKeypair,
    transport: T,
    config: EngineConfig,
    table: LinkTable<T::Handle>,
    on_message: Option<MessageHandler>,
}

impl<T: Transport> Engine<T> {
    /// Create an engine with a freshly generated identity and default config.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        Self::with_identity(IdentityKeypair::generate(), transport, config)
    }

    pub fn with_identity(identity: IdentityKeypair, transport: T, config: EngineConfig) -> Self {
        debug!(address = %identity.address(), "link engine started");
        Self {
            identity,
            transport,
            config,
            table: LinkTable::new(),
            on_message: None,
        }
    }

    /// Local address, stable for the lifetime of the engine.
    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.identity.public_key_bytes()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register the handler for decrypted inbound messages, replacing any
    /// previous one.
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: FnMut(Address, Bytes) + Send + 'static,
    {
        self.on_message = Some(Box::new(handler));
    }

    /// Start a handshake with `peer`.
    ///
    /// Calling this again before the proof arrives sends a second request
    /// with a new nonce; either proof will complete the link.
    pub fn connect(&mut self, peer: T::Handle) {
        let request = Packet::LinkRequest(LinkRequest {
            public_key: self.identity.public_key_bytes(),
            nonce: random_nonce(),
        });

        self.table.mark_pending(peer.clone());
        self.transport.send(&peer, request.encode());
        debug!(peer = ?peer, "link request sent");
    }

    /// Seal `payload` for `destination` and send it over the link that last
    /// proved that address.
    pub fn send_message(&mut self, destination: &Address, payload: &[u8]) -> Result<(), LinkError> {
        let (peer, session) = match self.table.resolve(destination) {
            Ok(found) => found,
            Err(RouteError::NoRoute) => {
                debug!(address = %destination, "no route");
                return Err(LinkError::NoRoute(*destination));
            }
            Err(RouteError::NoSession) => {
                warn!(address = %destination, "route has no matching session");
                return Err(LinkError::NoRoute(*destination));
            }
        };

        if payload.len() > self.config.max_payload_len {
            return Err(LinkError::PayloadTooLarge {
                len: payload.len(),
                max: self.config.max_payload_len,
            });
        }

        let nonce = random_nonce();
        let ciphertext = session.key().seal(&nonce, payload)?;

        let packet = Packet::Data(DataPacket {
            destination: *destination,
            nonce,
            ciphertext: Bytes::from(ciphertext),
        });

        self.transport.send(peer, packet.encode());
        trace!(peer = ?peer, address = %destination, len = payload.len(), "data sent");
        Ok(())
    }

    /// [`send_message`](Self::send_message) for UTF-8 text.
    pub fn send_text(&mut self, destination: &Address, text: &str) -> Result<(), LinkError> {
        self.send_message(destination, text.as_bytes())
    }

    /// Process one packet received from `peer`.
    pub fn on_packet(&mut self, peer: T::Handle, bytes: Bytes) -> Result<Inbound, LinkError> {
        let packet = match Packet::decode(bytes) {
            Ok(packet) => packet,
            Err(WireError::UnknownPacketType(packet_type)) => {
                trace!(peer = ?peer, packet_type, "unknown packet type ignored");
                return Ok(Inbound::Ignored { packet_type });
            }
            Err(WireError::Empty) => {
                trace!(peer = ?peer, "empty frame rejected");
                return Err(LinkError::Malformed(WireError::Empty));
            }
            Err(err) => {
                warn!(peer = ?peer, error = %err, "malformed packet rejected");
                return Err(LinkError::Malformed(err));
            }
        };

        match packet {
            Packet::LinkRequest(request) => self.handle_link_request(peer, request),
            Packet::LinkProof(proof) => self.handle_link_proof(peer, proof),
            Packet::Data(data) => Ok(self.handle_data(peer, data)),
        }
    }

    fn handle_link_request(
        &mut self,
        peer: T::Handle,
        request: LinkRequest,
    ) -> Result<Inbound, LinkError> {
        let address = derive_address(&request.public_key);
        let key = self.agree(&peer, &request.public_key)?;

        // The proof is sealed under the requester's nonce and echoes it back.
        let public_key = self.identity.public_key_bytes();
        let ciphertext = key.seal(&request.nonce, &public_key)?;

        self.table.establish(peer.clone(), address, key);

        let proof = Packet::LinkProof(LinkProof {
            public_key,
            nonce: request.nonce,
            ciphertext: Bytes::from(ciphertext),
        });
        self.transport.send(&peer, proof.encode());

        debug!(peer = ?peer, address = %address, "link request answered");
        Ok(Inbound::LinkRequested { address })
    }

    fn handle_link_proof(&mut self, peer: T::Handle, proof: LinkProof) -> Result<Inbound, LinkError> {
        if !self.config.accept_unsolicited_proofs && !self.table.is_pending(&peer) {
            warn!(peer = ?peer, "unsolicited link proof rejected");
            return Err(LinkError::UnsolicitedProof {
                peer: format!("{:?}", peer),
            });
        }

        let address = derive_address(&proof.public_key);
        let key = self.agree(&peer, &proof.public_key)?;

        let sealed_key = match key.open(&proof.nonce, &proof.ciphertext) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                warn!(peer = ?peer, address = %address, "link proof failed authentication");
                return Err(LinkError::HandshakeAuthentication {
                    peer: format!("{:?}", peer),
                });
            }
        };

        if self.config.verify_proof_identity && !constant_time_eq(&sealed_key, &proof.public_key)
        {
            warn!(peer = ?peer, address = %address, "link proof sealed a different key");
            return Err(LinkError::IdentityMismatch {
                peer: format!("{:?}", peer),
            });
        }

        self.table.establish(peer.clone(), address, key);
        self.table.clear_pending(&peer);

        debug!(peer = ?peer, address = %address, "link established");
        Ok(Inbound::LinkEstablished { address })
    }

    fn handle_data(&mut self, peer: T::Handle, data: DataPacket) -> Inbound {
        let Some(session) = self.table.session_mut(&peer) else {
            trace!(peer = ?peer, "data without session dropped");
            return Inbound::Dropped(DropReason::NoSession);
        };

        let plaintext = match session.key().open(&data.nonce, &data.ciphertext) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                trace!(peer = ?peer, "data failed authentication, dropped");
                return Inbound::Dropped(DropReason::DecryptionFailed);
            }
        };

        session.touch();
        let source = session.remote_address();

        if data.destination != self.identity.address() {
            debug!(
                peer = ?peer,
                destination = %data.destination,
                "data sealed for another address"
            );
        }

        let payload = Bytes::from(plaintext);
        if let Some(handler) = self.on_message.as_mut() {
            handler(source, payload.clone());
        }

        trace!(peer = ?peer, source = %source, len = payload.len(), "data delivered");
        Inbound::Delivered {
            source,
            destination: data.destination,
            payload,
        }
    }

    fn agree(&self, peer: &T::Handle, public_key: &[u8; 32]) -> Result<LinkKey, LinkError> {
        LinkKey::agree(&self.identity, public_key).map_err(|source| {
            warn!(peer = ?peer, error = %source, "rejected peer public key");
            LinkError::InvalidPeerKey {
                peer: format!("{:?}", peer),
                source,
            }
        })
    }

    pub fn link_state(&self, peer: &T::Handle) -> LinkState {
        self.table.state(peer)
    }

    pub fn session(&self, peer: &T::Handle) -> Option<&Session> {
        self.table.session(peer)
    }

    /// Handle that `address` currently routes to.
    pub fn route(&self, address: &Address) -> Option<&T::Handle> {
        self.table.route(address)
    }

    pub fn session_count(&self) -> usize {
        self.table.len()
    }
}
