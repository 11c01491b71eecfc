// CLI entry point for the rock-paper-scissors duel server.
//
// Starts a standalone server that game clients connect to over TCP with the
// framed JSON protocol from `rps_protocol`. See `server.rs` for the
// networking architecture and `game.rs` for the match state machine.
//
// Usage:
//   rps-server [OPTIONS]
//     --port <PORT>        Listen port (default: 3000)
//     --max-rounds <N>     Rounds per match (default: 5)
//
// Logging goes through `env_logger`; set RUST_LOG=info (or debug) to see
// connection and room lifecycle events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rps_server::server::{ServerConfig, start_server};

fn main() {
    env_logger::init();
    let config = parse_args();

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Server listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The process exits on SIGINT/SIGTERM by default, which is fine for a
    // stateless game server — there is nothing to flush. The flag is never
    // cleared here; embedders stop the server through its handle instead.
    let running = Arc::new(AtomicBool::new(true));
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    println!("\nShutting down...");
    handle.stop();
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> ServerConfig {
    let mut config = ServerConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--max-rounds" => {
                i += 1;
                config.max_rounds =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--max-rounds requires a valid number");
                        std::process::exit(1);
                    });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: rps-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>        Listen port (default: 3000)");
    println!("  --max-rounds <N>     Rounds per match (default: 5)");
    println!("  --help, -h           Show this help");
}
