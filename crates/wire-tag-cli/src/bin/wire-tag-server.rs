//! Serves canned status/container replies over the wire-tag protocol.

use clap::Parser;
use proven_wire_tag::{
    EngineConfig, Responder, ServerConfig, TcpServer, UnknownTypePolicy, select_codec,
};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve with a protocol version", long_about = None)]
struct Args {
    /// Protocol version [1 - envelope, 2 - integer tag, 3 - opcode]
    #[arg(
        short = 'v',
        long = "protocol-version",
        default_value_t = 1,
        env = "WIRE_TAG_VERSION"
    )]
    protocol_version: u32,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:6565", env = "WIRE_TAG_LISTEN")]
    listen: SocketAddr,

    /// Leave requests with unknown or missing types unanswered instead of
    /// replying with an error
    #[arg(long, env = "WIRE_TAG_IGNORE_UNKNOWN")]
    ignore_unknown: bool,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = 100, env = "WIRE_TAG_MAX_CONNECTIONS")]
    max_connections: usize,

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

    let codec = select_codec(args.protocol_version)?;
    let policy = if args.ignore_unknown {
        UnknownTypePolicy::Ignore
    } else {
        UnknownTypePolicy::Reject
    };
    let config = EngineConfig::default()
        .with_version(codec.version())
        .with_unknown_type_policy(policy);

    let server_config = ServerConfig {
        max_connections: args.max_connections,
        ..ServerConfig::default()
    };
    let server = TcpServer::bind(args.listen, Responder::new(&config), server_config).await?;

    info!(
        "serve with protocol version {} on address {}",
        codec.version(),
        args.listen
    );

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    if let Err(e) = server.serve(shutdown).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
