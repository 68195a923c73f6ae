use clap::{Parser, Subcommand};
use media_gal::gallery::Gallery;
use media_gal::{config, output, site};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "media-gal")]
#[command(version)]
#[command(about = "Browsable gallery tree for a directory of photos and videos")]
#[command(long_about = "\
Browsable gallery tree for a directory of photos and videos

The directory tree is the data source. Directories become galleries, images
and videos become media pages, and a video is shown through the image that
shares its base name.

Content structure:

  content/
  ├── config.toml          # Site config (optional)
  ├── a.jpg                # Poster for a.mp4, not listed on its own
  ├── a.mp4                # Video page, thumbnail taken from a.jpg
  ├── b.png                # Image page
  ├── clip.flv             # Skipped: no poster image
  └── Travel/              # Gallery
      ├── index.md         # Custom layout for the Travel page
      └── x.jpg

Derived images are written to a `resized/` directory next to their source
and reused across runs.

Run 'media-gal gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Gallery root directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory for copied originals and derived images
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (pages.json)
    #[arg(long, default_value = ".media-gal-temp", global = true)]
    temp_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the classified gallery tree
    Scan,
    /// Generate derived images, copy static files and write pages.json
    Build {
        /// Regenerate derived images even when they exist on disk
        #[arg(long)]
        force: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Scan => {
            let gallery = Gallery::load(&cli.source)?;
            output::print_scan_output(&gallery.root_node())?;
        }
        Command::Build { force } => {
            let gallery = Gallery::load(&cli.source)?;
            init_thread_pool(&gallery.config().processing);

            info!(source = %gallery.root().display(), output = %cli.output.display(), "building gallery");
            let report = site::build(&gallery, &cli.output, force)?;

            std::fs::create_dir_all(&cli.temp_dir)?;
            let pages_path = cli.temp_dir.join("pages.json");
            site::write_pages_json(&report.pages, &pages_path)?;
            info!(path = %pages_path.display(), "wrote page data");

            output::print_build_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the fmt subscriber on stderr so stdout stays reserved for command output.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
