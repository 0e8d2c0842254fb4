use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabasamu::config::{ConfigStore, JsonFileConfigStore, MemoryConfigStore};
use tabasamu::filter::ReplacementTable;
use tabasamu::{Tabasamu, TabasamuConfig};

#[derive(Parser)]
#[command(name = "tabasamu")]
#[command(about = "Selectable smilies for HTML content", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.tabasamu/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Packages directory, overriding the config file
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Image base URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Option store file holding the active package
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available smilies packages
    List,
    /// Show the replacement rules of a package
    Show {
        /// Package name
        package: String,
    },
    /// Filter HTML from stdin to stdout
    Filter {
        /// Use this package instead of the stored choice
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Store the active package
    Select {
        /// Package name
        package: String,
    },
    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TabasamuConfig::load(path),
        None => TabasamuConfig::load_default(),
    }
    .context("failed to load configuration")?;
    if let Some(dir) = cli.dir {
        config.packages_dir = dir;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let store: Arc<dyn ConfigStore> = match cli.options {
        Some(path) => Arc::new(
            JsonFileConfigStore::open(&path)
                .with_context(|| format!("failed to open option store {}", path.display()))?,
        ),
        None => Arc::new(MemoryConfigStore::new()),
    };

    match cli.command {
        Some(Commands::Version) | None => {
            println!("tabasamu {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::List) => {
            let plugin = Tabasamu::new(config, store);
            let active = plugin.active_package();
            for (name, label) in plugin.package_choices()? {
                let marker = if active.as_deref() == Some(name.as_str()) { "*" } else { " " };
                println!("{} {:<20} {}", marker, name, label);
            }
        }
        Some(Commands::Show { package }) => {
            let descriptor = config
                .loader()
                .load_package(&package)
                .with_context(|| format!("failed to load package '{}'", package))?;
            println!("{} ({})", descriptor.label(), descriptor.base_path.display());
            let table = ReplacementTable::build(&descriptor);
            for rule in table.rules() {
                println!("{:<8} =>{}", rule.token, rule.rendered_markup);
            }
        }
        Some(Commands::Filter { package }) => {
            let store: Arc<dyn ConfigStore> = Arc::new(config.render_store(store.as_ref(), package));
            let plugin = Tabasamu::new(config, store);

            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            io::stdout().write_all(plugin.filter().apply(&input).as_bytes())?;
        }
        Some(Commands::Select { package }) => {
            let plugin = Tabasamu::new(config, store);
            plugin
                .select_package(&package)
                .with_context(|| format!("cannot select package '{}'", package))?;
            println!("Active smilies package: {}", package);
        }
    }

    Ok(())
}
