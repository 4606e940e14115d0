//! beaconctl - command line access to the beacon discovery daemon

use anyhow::Context;
use beacon_client::{DiscoveryClient, Heartbeat};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;

/// Beacon CLI
#[derive(Parser)]
#[command(name = "beaconctl")]
#[command(about = "Register, announce and discover live broadcasts", long_about = None)]
#[command(version)]
struct Cli {
    /// Discovery daemon URL
    #[arg(short, long, env = "BEACON_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Log level
    #[arg(long, env = "BEACON_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every known broadcast
    List,
    /// Show one broadcast by broadcaster id
    Find {
        broadcaster_id: String,
    },
    /// Register (or refresh) a broadcaster once
    Register {
        broadcaster_id: String,
        stream_url: String,
    },
    /// Remove a broadcaster
    Deregister {
        broadcaster_id: String,
    },
    /// Register and keep heartbeating until Ctrl+C, then deregister
    Announce {
        broadcaster_id: String,
        stream_url: String,

        /// Seconds between heartbeats
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let client = DiscoveryClient::new(&cli.server)
        .with_context(|| format!("Invalid server URL {}", cli.server))?;

    match cli.command {
        Commands::List => print_json(&client.list().await?)?,
        Commands::Find { broadcaster_id } => match client.find(&broadcaster_id).await? {
            Some(broadcast) => print_json(&broadcast)?,
            None => anyhow::bail!("Broadcaster {} not found", broadcaster_id),
        },
        Commands::Register {
            broadcaster_id,
            stream_url,
        } => print_json(&client.register(&broadcaster_id, &stream_url).await?)?,
        Commands::Deregister { broadcaster_id } => {
            client.deregister(&broadcaster_id).await?;
            println!("Deregistered {}", broadcaster_id);
        }
        Commands::Announce {
            broadcaster_id,
            stream_url,
            interval_secs,
        } => {
            let mut heartbeat = Heartbeat::spawn(
                client,
                broadcaster_id,
                stream_url,
                Duration::from_secs(interval_secs),
            );

            tokio::select! {
                registered = heartbeat.registered() => {
                    if let Some(info) = registered {
                        print_json(&info)?;
                    }
                    println!("Announcing every {}s (Ctrl+C to stop)...", interval_secs);
                    tokio::signal::ctrl_c().await?;
                }
                result = tokio::signal::ctrl_c() => result?,
            }

            heartbeat.stop().await?;
            println!("Stopped announcing");
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announce_interval_must_be_positive() {
        let err = Cli::try_parse_from([
            "beaconctl",
            "announce",
            "user123",
            "rtsp://127.0.0.1:5051/x",
            "--interval-secs",
            "0",
        ]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from([
            "beaconctl",
            "announce",
            "user123",
            "rtsp://127.0.0.1:5051/x",
            "--interval-secs",
            "2",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Announce { interval_secs: 2, .. }
        ));
    }
}
