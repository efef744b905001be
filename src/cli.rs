//! Command-line arguments.

use clap::Parser;

/// Literal second argument that selects the supervisor path.
pub const CLUSTER_MODE: &str = "CLUSTER";

/// Port used when the first argument is missing or unusable.
pub const DEFAULT_PORT: u16 = 8080;

/// Lenient port parsing: non-numeric, out-of-range, and `0` all fall back
/// to [`DEFAULT_PORT`], so every worker of a cluster binds the same port.
fn parse_port(raw: &str) -> Result<u16, std::convert::Infallible> {
    Ok(raw
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT))
}

/// `catalog-chat-gateway [PORT] [MODE] [--workers N]`
#[derive(Debug, Clone, Parser)]
#[command(
    name = "catalog-chat-gateway",
    version,
    about = "Live catalog and chat over HTTP and WebSocket, optionally clustered",
    long_about = None
)]
pub struct Cli {
    /// Port to listen on; anything that is not a non-zero port number
    /// means 8080
    #[arg(default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Pass `CLUSTER` to run a supervisor with one worker per CPU
    pub mode: Option<String>,

    /// Number of workers in cluster mode (overrides `WORKERS`)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl Cli {
    /// Returns `true` if this process should supervise workers instead of
    /// serving requests itself.
    #[must_use]
    pub fn is_cluster(&self) -> bool {
        self.mode.as_deref() == Some(CLUSTER_MODE)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let Ok(cli) = Cli::try_parse_from(args) else {
            panic!("failed to parse {args:?}");
        };
        cli
    }

    #[test]
    fn defaults_to_single_worker_on_8080() {
        let cli = parse(&["catalog-chat-gateway"]);
        assert_eq!(cli.port, 8080);
        assert!(!cli.is_cluster());
    }

    #[test]
    fn cluster_flag_is_literal() {
        assert!(parse(&["catalog-chat-gateway", "9000", "CLUSTER"]).is_cluster());
        assert!(!parse(&["catalog-chat-gateway", "9000", "cluster"]).is_cluster());
        assert!(!parse(&["catalog-chat-gateway", "9000", "FORK"]).is_cluster());
    }

    #[test]
    fn workers_override() {
        let cli = parse(&["catalog-chat-gateway", "9000", "CLUSTER", "--workers", "2"]);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(cli.port, 9000);
    }

    #[test]
    fn unusable_port_falls_back_to_default() {
        let cli = parse(&["catalog-chat-gateway", "abc", "CLUSTER"]);
        assert_eq!(cli.port, DEFAULT_PORT);
        assert!(cli.is_cluster());

        let cli = parse(&["catalog-chat-gateway", "0", "CLUSTER"]);
        assert_eq!(cli.port, DEFAULT_PORT);
        assert!(cli.is_cluster());

        assert_eq!(parse(&["catalog-chat-gateway", "70000"]).port, DEFAULT_PORT);
    }

    #[test]
    fn first_argument_is_always_the_port_slot() {
        let cli = parse(&["catalog-chat-gateway", "CLUSTER"]);
        assert_eq!(cli.port, DEFAULT_PORT);
        assert!(!cli.is_cluster());
    }
}
