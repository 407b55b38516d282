use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use taxonomy_classifier::{
    construct, init, Classifier, ClassifierError, ConstructConfig, InitConfig, LoadConfig,
};
use tracing_subscriber::EnvFilter;

/// Hierarchical taxonomy classifier
#[derive(Parser, Debug)]
#[command(name = "taxonomy-classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and query a TF-IDF centroid classifier over a category taxonomy")]
struct Args {
    /// Verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the corpus and partition artifacts from a taxonomy
    Construct {
        /// JSON config with rdfPath, bow, bowPart and optional categoryMinSize
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Train the classifier model from construct's artifacts
    Init {
        /// JSON config with bow, bowPart, filter and classifier
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Classify text with a trained model
    Classify {
        /// Model file written by init
        #[arg(long)]
        classifier: PathBuf,

        /// Maximum number of categories
        #[arg(short, long, default_value_t = 3)]
        max: usize,

        /// Report cleaned category names, each at most once
        #[arg(long)]
        unique: bool,

        /// Report only the best category
        #[arg(long, conflicts_with = "unique")]
        top: bool,

        text: String,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), ClassifierError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    let out = out.map_err(|e| ClassifierError::serialization(e.to_string()))?;
    println!("{out}");
    Ok(())
}

fn run(args: Args) -> Result<(), ClassifierError> {
    match args.command {
        Command::Construct { config } => {
            let config = ConstructConfig::from_file(&config)?;
            let summary = construct(&config)?;
            print_json(&summary, args.pretty)
        }
        Command::Init { config } => {
            let config = InitConfig::from_file(&config)?;
            let model = init(&config)?;
            print_json(&serde_json::json!({ "categories": model.category_count() }), args.pretty)
        }
        Command::Classify { classifier, max, unique, top, text } => {
            let service = Classifier::new();
            service.load(&LoadConfig::new(classifier))?;
            if top {
                print_json(&service.classify_top(&text)?, args.pretty)
            } else if unique {
                print_json(&service.classify_unique(&text, max)?, args.pretty)
            } else {
                print_json(&service.classify(&text, max)?, args.pretty)
            }
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
