mod render;

use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;

use dotgrid::{Endpoint, NullInput, Session, SessionConfig, SessionRole};
use render::LogRenderer;

#[derive(Parser)]
#[command(name = "dotgrid")]
#[command(about = "Two-peer UDP dot exchange")]
#[command(override_usage = "dotgrid [ADDRESS] <PORT>")]
struct Args {
    /// Peer address to join; with a single argument this process hosts
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// UDP port (second argument in client mode)
    #[arg(value_name = "PORT")]
    port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let (address, port) = match args.port.as_deref() {
        Some(port) => (Some(args.address.as_str()), port),
        None => (None, args.address.as_str()),
    };

    let endpoint = Endpoint::resolve(address, port)?;

    let mut session = match endpoint.role() {
        SessionRole::Host => Session::host(&endpoint, SessionConfig::default())?,
        SessionRole::Client => Session::client(&endpoint, SessionConfig::default())?,
    };

    let running = session.running();
    let mut loop_task = tokio::task::spawn_blocking(move || {
        let mut input = NullInput;
        let mut renderer = LogRenderer;
        session.run(&mut input, &mut renderer)
    });

    tokio::select! {
        result = &mut loop_task => result??,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupt received, shutting down");
            running.store(false, Ordering::SeqCst);
            loop_task.await??;
        }
    }

    Ok(())
}
