#[cfg(not(feature = "node"))]
fn main() {
    eprintln!("Build with --features node to enable the ledger node.");
}

#[cfg(feature = "node")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use clap::Parser;
    use flightsure_core::call::Call;
    use flightsure_core::config::GenesisConfig;
    use flightsure_core::ledger::Ledger;
    use flightsure_core::notify::LogSink;
    use flightsure_core::service::node::{NodeConfig, NodeHandle};
    use std::fs;
    use std::io::{BufRead, BufReader};
    use std::path::PathBuf;
    use tracing_subscriber::EnvFilter;

    #[derive(Parser)]
    #[command(name = "flightsure-node")]
    #[command(about = "Flight-delay insurance ledger node")]
    #[command(version)]
    struct Cli {
        /// Genesis configuration (JSON)
        #[arg(short, long)]
        genesis: PathBuf,

        /// Directory for ledger_snapshot.json; state is restored from it when present
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// JSON-lines file of calls to apply in order
        #[arg(short, long)]
        calls: Option<PathBuf>,
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let genesis: GenesisConfig = serde_json::from_str(&fs::read_to_string(&cli.genesis)?)?;

    let node = NodeHandle::start(
        Ledger::builder(genesis).sink(LogSink),
        NodeConfig {
            data_dir: cli.data_dir,
        },
    )?;

    if let Some(path) = cli.calls {
        let reader = BufReader::new(fs::File::open(&path)?);
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let result = match serde_json::from_str::<Call>(&line) {
                Ok(call) => match node.submit(call) {
                    Ok(outcome) => serde_json::json!({ "line": n + 1, "ok": outcome }),
                    Err(e) => serde_json::json!({ "line": n + 1, "error": e.to_string() }),
                },
                Err(e) => serde_json::json!({ "line": n + 1, "error": format!("bad call: {e}") }),
            };
            println!("{result}");
        }
    }

    let snap = node.snapshot();
    println!(
        "{}",
        serde_json::json!({
            "operational": snap.is_operational(),
            "airlines": snap.airline_count(),
            "flights": snap.flight_count(),
            "treasury": snap.treasury(),
        })
    );
    node.shutdown()?;
    Ok(())
}
