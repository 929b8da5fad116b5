use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use directory_cli::cli::commands;
use directory_cli::cli::DirectoryConfig;
use directory_cli::tracing_setup::init_tracing;

#[derive(Parser)]
#[command(name = "directory-cli")]
#[command(about = "Inspect directory filter state and focus-area selections")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (store profiles)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count active filters in a query string
    Count {
        #[arg(long, short)]
        query: String,
        /// Store profile to apply (teams, members, projects)
        #[arg(long, short, default_value = "teams")]
        namespace: String,
    },

    /// List the ancestors of the focus areas selected in a query string
    Ancestors {
        /// JSON file with the focus-area tree
        #[arg(long, short)]
        tree: PathBuf,
        #[arg(long, short)]
        query: String,
        #[arg(long, short, default_value = "teams")]
        namespace: String,
    },

    /// List every focus area below a node
    Descendants {
        #[arg(long, short)]
        tree: PathBuf,
        #[arg(long, short)]
        uid: String,
    },

    /// Click a focus area and print the resulting query string
    Toggle {
        #[arg(long, short)]
        tree: PathBuf,
        #[arg(long, short)]
        query: String,
        #[arg(long, short)]
        uid: String,
        #[arg(long, short, default_value = "teams")]
        namespace: String,
    },

    /// Load a focus-area tree and report its shape
    Validate {
        #[arg(long, short)]
        tree: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match run(&cli) {
        Ok(output) => {
            let rendered = if cli.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            };
            match rendered {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<serde_json::Value> {
    let config = DirectoryConfig::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Count { query, namespace } => commands::count(&config.profile(namespace), query),
        Commands::Ancestors {
            tree,
            query,
            namespace,
        } => {
            let tree = commands::load_tree(tree)?;
            commands::ancestors(&tree, &config.profile(namespace), query)
        }
        Commands::Descendants { tree, uid } => {
            let tree = commands::load_tree(tree)?;
            commands::descendants(&tree, uid)
        }
        Commands::Toggle {
            tree,
            query,
            uid,
            namespace,
        } => {
            let tree = commands::load_tree(tree)?;
            commands::toggle(&tree, &config.profile(namespace), query, uid)
        }
        Commands::Validate { tree } => {
            let tree = commands::load_tree(tree)?;
            Ok(commands::validate(&tree))
        }
    }
}
