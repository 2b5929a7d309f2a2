use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use bg_index::{config, output, remote, scan};
use bg_index::types::IndexDocument;

/// Shared flag for commands that write an index.
#[derive(Args, Clone)]
struct ShapeArgs {
    /// Emit a flat list of slash-joined paths instead of the nested tree
    #[arg(long)]
    flat: bool,
}

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Called once at startup; the leak is a single short string.
        Box::leak(format!("{}+{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "bg-index")]
#[command(about = "JSON index generator for background image collections")]
#[command(long_about = "\
JSON index generator for background image collections

Walks a directory tree of images — local, or a GitHub repository subtree
fetched through the contents API — and writes a bg_index.json the site's
background rotator consumes. Only filenames are read, never image content.

Two output shapes, selected with --flat:

  nested (default)                        flat
  {                                       {
    \"version\": 2,                           \"version\": 2,
    \"lastUpdate\": \"...Z\",                   \"lastUpdate\": \"...Z\",
    \"structure\": {                          \"images\": [
      \".\": [\"a.png\"],                         \"a.png\",
      \"sub\": [\"b.jpg\"]                        \"sub/b.jpg\"
    }                                       ]
  }                                       }

Images directly in a directory that also has subdirectories appear under
the reserved \".\" key. Directories whose whole subtree holds no images are
omitted.

Configuration lives in bg-index.toml inside the source directory; run
'bg-index gen-config' to print a documented stock file.")]
#[command(version = version_string())]
struct Cli {
    /// Directory to index (and to read bg-index.toml from)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index the local directory tree
    Scan(ShapeArgs),
    /// Index the configured GitHub repository subtree
    Fetch(ShapeArgs),
    /// Scan and report the image count without writing the index
    Check,
    /// Print a stock bg-index.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(shape) => {
            let config = config::load_config(&cli.source)?;
            let document = if shape.flat {
                IndexDocument::flat(scan::build_flat(&cli.source, &config)?)
            } else {
                IndexDocument::nested(scan::build_structure(&cli.source, &config)?)
            };
            output::write_index(&cli.source.join(&config.output_file), &document)?;
            output::print_summary(&document, &config.output_file);
        }
        Command::Fetch(shape) => {
            let mut config = config::load_config(&cli.source)?;
            config.remote.validate_for_fetch()?;
            if config.remote.auth_token.is_none() {
                config.remote.auth_token = std::env::var("GITHUB_TOKEN").ok();
            }

            let source = remote::GitHubSource::new(&config.remote)?;
            let root_url = config.remote.root_url();
            let document = if shape.flat {
                IndexDocument::flat(remote::build_flat(&source, &config, &root_url))
            } else {
                IndexDocument::nested(remote::build_structure(&source, &config, &root_url))
            };
            output::write_index(&cli.source.join(&config.output_file), &document)?;
            output::print_summary(&document, &config.output_file);
        }
        Command::Check => {
            let config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let document = IndexDocument::nested(scan::build_structure(&cli.source, &config)?);
            output::print_check_summary(&document);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
