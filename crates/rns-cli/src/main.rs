//! RNS CLI tools: identities, packet inspection, local loopback.

#![forbid(unsafe_code)]

mod loopback;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use rns_core::Packet;
use rns_crypto::IdentityKeypair;
use rns_link::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "rns")]
#[command(about = "RNS overlay tools")]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true, env = "RNS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an identity and print its address
    Address {
        /// Derive from a hex-encoded 32-byte secret instead of generating one
        #[arg(long)]
        secret: Option<String>,

        /// Print the secret key as well
        #[arg(long)]
        show_secret: bool,
    },

    /// Decode a hex-encoded packet and describe it
    Decode {
        /// Packet bytes as hex
        hex: String,
    },

    /// Link two in-process nodes and exchange a message
    Loopback {
        /// Message to send
        #[arg(short, long, default_value = "hello")]
        message: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    rns_common::init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Address {
            secret,
            show_secret,
        } => {
            let keypair = match secret {
                Some(secret) => IdentityKeypair::from_bytes(&parse_secret(&secret)?),
                None => IdentityKeypair::generate(),
            };

            println!("Address:    {}", keypair.address());
            println!("Public key: {}", hex::encode(keypair.public_key_bytes()));
            if show_secret {
                println!("Secret key: {}", hex::encode(keypair.private_key_bytes()));
            }
        }
        Command::Decode { hex: input } => {
            let raw = hex::decode(input.trim()).context("packet is not valid hex")?;
            let packet = Packet::decode(Bytes::from(raw))?;
            println!("{}", serde_json::to_string_pretty(&describe(&packet))?);
        }
        Command::Loopback { message } => {
            let config: EngineConfig =
                rns_common::load_json_or_default(args.config.as_deref())?;

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(loopback::run(&message, config))?;
        }
        Command::Version => {
            println!("rns {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn parse_secret(input: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(input.trim()).context("secret is not valid hex")?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("secret must be 32 bytes, got {}", b.len()))
}

/// Field-by-field view of a packet for display.
fn describe(packet: &Packet) -> serde_json::Value {
    use rns_crypto::derive_address;
    use serde_json::json;

    match packet {
        Packet::LinkRequest(req) => json!({
            "type": packet.packet_type().name(),
            "public_key": hex::encode(req.public_key),
            "address": derive_address(&req.public_key),
            "nonce": hex::encode(req.nonce),
        }),
        Packet::LinkProof(proof) => json!({
            "type": packet.packet_type().name(),
            "public_key": hex::encode(proof.public_key),
            "address": derive_address(&proof.public_key),
            "nonce": hex::encode(proof.nonce),
            "ciphertext_len": proof.ciphertext.len(),
        }),
        Packet::Data(data) => json!({
            "type": packet.packet_type().name(),
            "destination": data.destination,
            "nonce": hex::encode(data.nonce),
            "ciphertext_len": data.ciphertext.len(),
        }),
    }
}
