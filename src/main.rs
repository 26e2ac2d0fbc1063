use clap::{Parser, Subcommand};
use scx_catalog::catalog::Catalog;
use scx_catalog::config::{self, Environment};
use scx_catalog::fetch::HttpSource;
use scx_catalog::output;
use scx_catalog::views::ViewKind;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scx-catalog")]
#[command(about = "Aggregate the SuttaCentral catalog into page views")]
#[command(long_about = "\
Aggregate the SuttaCentral catalog into page views

Walks the upstream menu from each configured root, attaches suttaplex
records, translations, text bodies and parallels to every text, then
flattens the tree into one JSON file per view:

  _data/
  ├── index.json                    # Top-level collections
  ├── pitaka.json                   # Groupings above chapters
  ├── chapters.json                 # Lowest groupings
  ├── chapters-by-leaf-parent.json  # Groupings that directly hold texts
  ├── text-meta.json                # One per text
  └── texts.json                    # One per text, language and author

Responses are cached on disk; a warm cache rebuilds without the network.
Set RUST_LOG to adjust logging (default: info).

Run 'scx-catalog gen-config' to generate a documented scx.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "scx.toml", global = true)]
    config: PathBuf,

    /// Override the configured environment
    #[arg(long, value_enum, global = true)]
    env: Option<Environment>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the tree and write every view as JSON
    Build {
        /// Output directory for view files
        #[arg(long, default_value = "_data")]
        out: PathBuf,
    },
    /// Build the tree and print it as an outline
    Tree {
        /// Stop printing below this depth
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print a stock scx.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Build { out } => {
            let catalog = load_catalog(&cli.config, cli.env)?;

            println!("==> Stage 1: Building catalog tree");
            let tree = catalog.tree().await;
            output::print_fetch_summary(&catalog.stats(), catalog.elapsed());

            println!("==> Stage 2: Writing views → {}", out.display());
            std::fs::create_dir_all(&out)?;
            let mut written = Vec::with_capacity(ViewKind::ALL.len());
            for kind in ViewKind::ALL {
                let entries = kind.flatten(&tree);
                write_view(&out, kind, &entries)?;
                written.push((kind, entries.len()));
            }
            output::print_build_output(&written, &out);

            println!("==> Build complete: {}", out.display());
        }
        Command::Tree { depth } => {
            let catalog = load_catalog(&cli.config, cli.env)?;
            let tree = catalog.tree().await;
            output::print_tree_output(&tree, depth);
            output::print_fetch_summary(&catalog.stats(), catalog.elapsed());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `scx.toml`, apply the CLI environment override, and wire up the
/// HTTP-backed catalog.
fn load_catalog(
    path: &Path,
    env: Option<Environment>,
) -> Result<Catalog<HttpSource>, Box<dyn std::error::Error>> {
    let mut catalog_config = config::load_config(path)?;
    if let Some(env) = env {
        catalog_config.environment = env;
    }
    Ok(Catalog::from_config(&catalog_config)?)
}

fn write_view<T: serde::Serialize>(
    out: &Path,
    kind: ViewKind,
    entries: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(out.join(kind.file_name()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), entries)?;
    Ok(())
}

/// Log to stderr so stdout stays clean for command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
