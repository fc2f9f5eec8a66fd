//! The olsrsim command-line entry point.

use std::error::Error;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use olsrsim_runner::{
    read_node_configs, Coordinator, LinkTopology, Node, NodeConfig,
};

/// Discrete-event simulator for the OLSR routing protocol.
#[derive(Debug, Parser)]
#[command(name = "olsrsim", version)]
struct Args {
    /// Node configuration file: `<id> <dst> "<payload>" <sendAtTick>` per line.
    #[arg(long)]
    nodes: PathBuf,

    /// Link-state schedule file: `<from> <to> <time> <up|down>` per line,
    /// sorted by non-decreasing time.
    #[arg(long)]
    links: PathBuf,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Directory for per-node message logs. Logs are discarded if omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    olsrsim_metrics::describe_metrics();

    if let Err(err) = run(Args::parse()) {
        eprintln!("olsrsim: {err}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let configs = read_node_configs(File::open(&args.nodes)?)?;
    let topology = LinkTopology::from_reader(File::open(&args.links)?)?;

    let mut coordinator = Coordinator::new(topology);
    for config in configs {
        coordinator.add_node(build_node(config, args.log_dir.as_deref())?);
    }

    let stats = coordinator.run(args.ticks)?;
    coordinator.shutdown()?;

    println!("{stats}");
    Ok(())
}

fn build_node(
    config: NodeConfig,
    log_dir: Option<&std::path::Path>,
) -> Result<Node, Box<dyn Error>> {
    let mut node = Node::new(config.id);
    if let Some(message) = config.message {
        node = node.with_data_message(message);
    }
    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)?;
        let input = File::create(dir.join(format!("node-{}.in.log", config.id)))?;
        let output = File::create(dir.join(format!("node-{}.out.log", config.id)))?;
        node = node
            .with_input_log(Box::new(input))
            .with_output_log(Box::new(output));
    }
    Ok(node)
}
