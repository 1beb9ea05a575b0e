//! In-process loopback: two engines linked over tokio channels.
//!
//! Each node runs as its own task that owns its engine and serializes every
//! engine call through one `select!` loop over inbound packets and commands.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use rns_link::{Address, Engine, EngineConfig, Inbound, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long to wait for any single step of the exchange.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

type NodeId = u32;

/// Transport delivering `(sender, packet)` into the receiving node's inbox.
#[derive(Clone)]
struct ChannelTransport {
    local: NodeId,
    inboxes: Arc<HashMap<NodeId, mpsc::UnboundedSender<(NodeId, Bytes)>>>,
}

impl Transport for ChannelTransport {
    type Handle = NodeId;

    fn send(&self, peer: &NodeId, packet: Bytes) {
        match self.inboxes.get(peer) {
            Some(inbox) => {
                if inbox.send((self.local, packet)).is_err() {
                    debug!(from = self.local, to = peer, "peer inbox closed, packet dropped");
                }
            }
            None => warn!(from = self.local, to = peer, "unknown peer handle"),
        }
    }
}

#[derive(Debug)]
enum Command {
    Connect(NodeId),
    Send { to: Address, text: String },
    Shutdown,
}

#[derive(Debug)]
enum Event {
    Linked { node: NodeId, address: Address },
    Message { node: NodeId, source: Address, text: String },
}

struct Node {
    address: Address,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Node {
    fn command(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("node {} has stopped", self.address.short()))
    }
}

fn spawn_node(
    id: NodeId,
    config: EngineConfig,
    inboxes: Arc<HashMap<NodeId, mpsc::UnboundedSender<(NodeId, Bytes)>>>,
    mut inbox: mpsc::UnboundedReceiver<(NodeId, Bytes)>,
    events: mpsc::UnboundedSender<Event>,
) -> Node {
    let transport = ChannelTransport { local: id, inboxes };
    let mut engine = Engine::with_config(transport, config);
    let address = engine.address();

    let message_events = events.clone();
    engine.on_message(move |source, payload| {
        let text = String::from_utf8_lossy(&payload).into_owned();
        let _ = message_events.send(Event::Message {
            node: id,
            source,
            text,
        });
    });

    let (commands, mut command_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some((from, packet)) = inbox.recv() => {
                    match engine.on_packet(from, packet) {
                        Ok(Inbound::LinkEstablished { address })
                        | Ok(Inbound::LinkRequested { address }) => {
                            let _ = events.send(Event::Linked { node: id, address });
                        }
                        Ok(other) => debug!(node = id, inbound = ?other, "packet processed"),
                        Err(e) => warn!(node = id, from, error = %e, "packet rejected"),
                    }
                }
                command = command_rx.recv() => {
                    match command {
                        Some(Command::Connect(peer)) => engine.connect(peer),
                        Some(Command::Send { to, text }) => {
                            if let Err(e) = engine.send_text(&to, &text) {
                                warn!(node = id, error = %e, "send failed");
                            }
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }
            }
        }
        debug!(node = id, "node stopped");
    });

    Node {
        address,
        commands,
        task,
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Result<Event> {
    timeout(STEP_TIMEOUT, events.recv())
        .await
        .context("timed out waiting for loopback event")?
        .ok_or_else(|| anyhow!("all loopback nodes stopped"))
}

/// Wait for the next message delivered to `node`, skipping link events.
async fn next_message(
    events: &mut mpsc::UnboundedReceiver<Event>,
    node: NodeId,
) -> Result<(Address, String)> {
    loop {
        match next_event(events).await? {
            Event::Message {
                node: to,
                source,
                text,
            } if to == node => return Ok((source, text)),
            other => debug!(event = ?other, "skipping event"),
        }
    }
}

/// Link two nodes, send `message` from the first to the second, and echo it
/// back. Prints each step.
pub async fn run(message: &str, config: EngineConfig) -> Result<()> {
    const ALICE: NodeId = 0;
    const BOB: NodeId = 1;

    let (alice_tx, alice_rx) = mpsc::unbounded_channel();
    let (bob_tx, bob_rx) = mpsc::unbounded_channel();
    let inboxes = Arc::new(HashMap::from([(ALICE, alice_tx), (BOB, bob_tx)]));
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let alice = spawn_node(
        ALICE,
        config.clone(),
        inboxes.clone(),
        alice_rx,
        events_tx.clone(),
    );
    let bob = spawn_node(BOB, config, inboxes, bob_rx, events_tx);

    println!("alice: {}", alice.address);
    println!("bob:   {}", bob.address);

    alice.command(Command::Connect(BOB))?;
    loop {
        match next_event(&mut events).await? {
            Event::Linked { node: ALICE, address } => {
                if address != bob.address {
                    bail!("alice linked to unexpected address {}", address);
                }
                break;
            }
            other => debug!(event = ?other, "waiting for alice's link"),
        }
    }
    info!("link established");
    println!("link established");

    alice.command(Command::Send {
        to: bob.address,
        text: message.to_string(),
    })?;
    let (source, text) = next_message(&mut events, BOB).await?;
    println!("bob   <- {}: {}", source.short(), text);

    bob.command(Command::Send { to: source, text })?;
    let (source, text) = next_message(&mut events, ALICE).await?;
    println!("alice <- {}: {}", source.short(), text);

    for node in [alice, bob] {
        node.command(Command::Shutdown)?;
        node.task.await.context("loopback node panicked")?;
    }

    Ok(())
}
