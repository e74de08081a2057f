//! Sends one tagged request to a wire-tag server and logs the reply.

use clap::Parser;
use proven_wire_tag::{
    ClientConfig, EngineConfig, MessageType, Requester, TcpClient, select_codec,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Send one tagged request", long_about = None)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1", env = "WIRE_TAG_HOST")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 6565, env = "WIRE_TAG_PORT")]
    port: u16,

    /// Message type [1 - status, 2 - container]
    #[arg(short = 't', long = "type", env = "WIRE_TAG_TYPE")]
    msg_type: u32,

    /// Protocol version [1 - envelope, 2 - integer tag, 3 - opcode]
    #[arg(
        short = 'v',
        long = "protocol-version",
        default_value_t = 1,
        env = "WIRE_TAG_VERSION"
    )]
    protocol_version: u32,

    /// Seconds to wait for the reply
    #[arg(long, default_value_t = 30, env = "WIRE_TAG_REPLY_TIMEOUT")]
    reply_timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    // Configuration errors are reported before any connection is made
    let codec = select_codec(args.protocol_version)?;
    let msg_type = MessageType::from_id(args.msg_type)?;

    let addr = tokio::net::lookup_host((args.host.as_str(), args.port))
        .await?
        .next()
        .ok_or_else(|| format!("could not resolve {}:{}", args.host, args.port))?;

    let transport = TcpClient::connect(addr, ClientConfig::default()).await?;
    let config = EngineConfig::default()
        .with_version(codec.version())
        .with_reply_timeout(Duration::from_secs(args.reply_timeout));
    let requester = Requester::new(transport, config);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    info!(
        "Requesting {} from {} with protocol {}",
        msg_type,
        addr,
        codec.version()
    );

    match requester.exchange_until_cancelled(msg_type, &cancel).await {
        Ok(Some(reply)) => info!("Exchange complete: {} message", reply.message_type()),
        Ok(None) => info!("Exchange abandoned"),
        Err(e) => {
            error!("Exchange failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
