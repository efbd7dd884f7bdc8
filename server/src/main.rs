use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::exit;

use server::acceptor::Acceptor;
use server::engine::Engine;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some((port, dim)) = parse_args(&args) else {
        eprintln!("Usage: server <port> <dim>");
        exit(1);
    };

    let engine = Engine::shared(dim);
    let addr = SocketAddr::new(IpAddr::from(Ipv4Addr::UNSPECIFIED), port);
    let acceptor = Acceptor::bind(addr, engine).await?;

    tracing::info!("server started on port {port}, board dimension {dim}");
    acceptor.run().await
}

fn parse_args(args: &[String]) -> Option<(u16, u32)> {
    if args.len() != 3 {
        return None;
    }
    let port = args[1].parse().ok()?;
    let dim = args[2].parse().ok()?;
    Some((port, dim))
}
