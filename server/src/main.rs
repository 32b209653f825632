use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use shared::{BoardMaker, DemoLevel, JsonLevel};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Players required to start a session
    #[clap(short, long, default_value_t = shared::DEFAULT_ROOM_SIZE)]
    room_size: usize,
    /// Level file in board JSON format; the built-in demo level is used if omitted
    #[clap(short, long)]
    board: Option<PathBuf>,
    /// Seconds a connection may stay silent before it is dropped
    #[clap(long, default_value = "60")]
    pong_wait_secs: u64,
    /// Seconds allowed for a single socket write
    #[clap(long, default_value = "10")]
    write_wait_secs: u64,
    /// Messages buffered per player before the player is disconnected
    #[clap(long, default_value = "5")]
    outbound_capacity: usize,
    /// Largest accepted client message in bytes
    #[clap(long, default_value = "512")]
    max_message_size: usize,
    /// Sessions allowed to run at once; each holds one blocking thread
    #[clap(long, default_value = "512")]
    max_sessions: usize,
    /// Print the level as board JSON and exit
    #[clap(long)]
    dump_board: bool,
}

/// Main-method of the application.
/// Parses command-line arguments, loads the level and runs the server until Ctrl+C.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let maker: Arc<dyn BoardMaker> = match &args.board {
        Some(path) => Arc::new(JsonLevel::new(std::fs::read_to_string(path)?)),
        None => Arc::new(DemoLevel),
    };

    // Build once up front so a broken level fails at startup instead of per session
    let board = maker.gen_board()?;

    if args.dump_board {
        println!("{}", serde_json::to_string_pretty(&board.to_view())?);
        return Ok(());
    }

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        room_size: args.room_size,
        outbound_capacity: args.outbound_capacity,
        pong_wait: Duration::from_secs(args.pong_wait_secs),
        write_wait: Duration::from_secs(args.write_wait_secs),
        max_message_size: args.max_message_size,
        max_sessions: args.max_sessions,
    };

    let runtime = config.runtime()?;
    runtime.block_on(serve(config, maker))
}

async fn serve(
    config: ServerConfig,
    maker: Arc<dyn BoardMaker>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(config, maker).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
