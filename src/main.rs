//! CLI for chatrelay
//!
//! Subcommands:
//! - `server`: run the relay
//! - `client`: connect to a relay, print the requested history and
//!   optionally keep printing live messages

use chatrelay::client::ChatClient;
use chatrelay::config::load_config;
use chatrelay::transport::{HistoryRequest, start_server};
use chatrelay::utils::logging;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

const REPLY_WAIT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "chatrelay")]
enum Command {
    /// Start the relay server
    Server,
    /// Connect to a relay and print messages
    Client {
        /// WebSocket endpoint to connect to
        #[arg(long, default_value = "ws://127.0.0.1:14222/chatapp/websocket")]
        url: String,
        /// First position of the history range
        #[arg(long, default_value_t = 0)]
        first_id: i64,
        /// End of the history range (exclusive); -1 means everything stored
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        last_id: i64,
        /// Keep the connection open and print live messages
        #[arg(long)]
        follow: bool,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    match cmd {
        Command::Server => {
            let config = match load_config() {
                Ok(config) => config,
                Err(e) => {
                    logging::init("info");
                    error!("Failed to load configuration: {e}");
                    std::process::exit(1);
                }
            };
            logging::init(&config.log.level);
            if let Err(e) = start_server(config).await {
                error!("Server failed: {e}");
                std::process::exit(1);
            }
        }
        Command::Client {
            url,
            first_id,
            last_id,
            follow,
        } => {
            logging::init("info");
            let request = HistoryRequest::new(first_id, last_id);
            if let Err(e) = run_client(&url, request, follow).await {
                error!("Client failed: {e}");
                std::process::exit(1);
            }
        }
    }
}

async fn run_client(
    url: &str,
    request: HistoryRequest,
    follow: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = ChatClient::connect(url).await?;
    info!("connected to {url}");
    client.request_history(request).await?;

    if !follow {
        // an empty range gets no reply, so only wait briefly for one
        match tokio::time::timeout(REPLY_WAIT, client.next_batch()).await {
            Ok(batch) => {
                if let Some(batch) = batch? {
                    print_batch(&batch);
                }
            }
            Err(_) => info!("no stored messages in range"),
        }
        client.close().await?;
        return Ok(());
    }

    while let Some(batch) = client.next_batch().await? {
        print_batch(&batch);
    }
    info!("relay closed the connection");
    Ok(())
}

fn print_batch(batch: &[chatrelay::broker::Message]) {
    for msg in batch {
        println!(
            "#{} [{}] {} <{}> {}: {}",
            msg.id, msg.date, msg.name, msg.email, msg.topic, msg.content
        );
    }
}
