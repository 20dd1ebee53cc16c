//! # tomlvar reload demo
//!
//! Re-reads a TOML file on an interval and publishes the new settings to a
//! reader thread. Each reload builds a brand-new [`VarSet`], so a bad file
//! never leaves half-applied values visible: the previous settings stay in
//! place until a complete parse succeeds.
//!
//! ```sh
//! cat > demo.toml <<EOF
//! [server]
//! greeting = "hello"
//! interval = "2s"
//! EOF
//! RUST_LOG=tomlvar=debug cargo run --example reload -- --config demo.toml
//! ```
//!
//! Edit `demo.toml` while it runs to watch the greeting change.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tomlvar::{ErrorHandling, TomlVarError, VarSet};

/// Periodically reload a TOML file and print its settings.
#[derive(Parser, Debug)]
#[command(name = "tomlvar-reload")]
struct Cli {
    /// Path to the TOML file to watch.
    #[arg(long)]
    config: PathBuf,

    /// How often to re-read the file.
    #[arg(long, default_value = "5s", value_parser = parse_interval)]
    reload_every: Duration,

    /// Stop after this many reloads.
    #[arg(long, default_value_t = 10)]
    rounds: usize,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    tomlvar::duration::parse(s).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    greeting: String,
    interval: Duration,
}

/// Declare, load and parse into a fresh set. Nothing is shared until this
/// returns successfully.
fn read_settings(path: &Path) -> Result<Settings, TomlVarError> {
    let mut vars = VarSet::new("reload", ErrorHandling::ContinueOnError);
    let greeting = vars.string("server.greeting", "hi");
    let interval = vars.duration("server.interval", Duration::from_secs(1));
    vars.load_file(path)?;
    vars.parse()?;
    Ok(Settings {
        greeting: greeting.get(),
        interval: interval.get(),
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let initial = match read_settings(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let current = Arc::new(Mutex::new(initial));

    let reader = {
        let current = Arc::clone(&current);
        thread::spawn(move || {
            for _ in 0..cli.rounds {
                let settings = current.lock().map(|s| s.clone());
                let Ok(settings) = settings else { break };
                println!("{}", settings.greeting);
                thread::sleep(settings.interval);
            }
        })
    };

    for _ in 0..cli.rounds {
        thread::sleep(cli.reload_every);
        match read_settings(&cli.config) {
            Ok(settings) => {
                if let Ok(mut slot) = current.lock() {
                    *slot = settings;
                }
            }
            Err(e) => tracing::error!("reload failed, keeping previous settings: {e}"),
        }
    }

    if reader.join().is_err() {
        tracing::error!("reader thread panicked");
    }
}
