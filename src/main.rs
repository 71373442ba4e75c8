use clap::{Parser, Subcommand};
use gallery_shrink::config::{self, DEFAULT_CONFIG_FILE, GalleryConfig};
use gallery_shrink::imaging::RustCodec;
use gallery_shrink::{batch, discover, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gallery-shrink")]
#[command(about = "Shrink photo galleries stored in ZIP archives")]
#[command(long_about = "\
Shrink photo galleries stored in ZIP archives

Every JPEG inside an archive is bounded to a maximum edge and re-encoded;
everything else is copied unchanged. The result is written next to the
source as <stem>-<suffix>.zip.

Input:
  Trip.zip          a single archive
  galleries/        every *.zip directly inside (earlier outputs skipped)
  archives.txt      one archive path per line, # comments allowed

Settings come from gallery-shrink.toml in the working directory (or
--config), overridden by command-line flags.

Run 'gallery-shrink gen-config' to generate a documented config file.")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Archive, directory of archives, or list file
    input: Option<PathBuf>,

    /// JPEG quality for re-encoded images (1-100)
    #[arg(short, long)]
    quality: Option<u32>,

    /// Maximum length of an image's longer edge, in pixels
    #[arg(short = 'm', long)]
    max_edge: Option<u32>,

    /// Suffix for output archives: Trip.zip → Trip-<suffix>.zip
    #[arg(short, long)]
    suffix: Option<String>,

    /// Leave out __MACOSX, .DS_Store, Thumbs.db and similar entries
    #[arg(long)]
    skip_garbage: bool,

    /// Copy images that cannot be decoded instead of dropping them
    #[arg(long)]
    keep_undecodable: bool,

    /// Config file (default: gallery-shrink.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads for image processing (capped at CPU count)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Print progress as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock gallery-shrink.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        return Err("no input given; pass an archive, a directory, or a list file".into());
    };

    let config = resolve_config(&cli)?;
    init_thread_pool(&config.processing);

    let found = discover::discover(input, &config.archive.suffix)?;
    tracing::debug!(mode = ?found.mode, archives = found.archives.len(), "starting run");

    let json = cli.json;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("cannot serialize event: {e}"),
                }
            } else {
                for line in output::format_event(&event) {
                    println!("{}", line);
                }
            }
        }
    });
    let summary = batch::run_batch(&RustCodec::new(), &found.archives, &config, Some(&tx));
    drop(tx);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    if json {
        println!("{}", summary_json(&summary)?);
    } else {
        output::print_summary(&summary);
    }

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

/// Stock defaults, then the config file, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<GalleryConfig, config::ConfigError> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let file = config::load_raw_config(&path)?;
    if file.is_none() && required {
        return Err(config::ConfigError::NotFound(path));
    }
    if file.is_some() {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    config::resolve_config(file.into_iter().chain([cli_overlay(cli)]))
}

/// Command-line flags as a TOML overlay. Only flags actually given appear.
fn cli_overlay(cli: &Cli) -> toml::Value {
    let mut images = toml::Table::new();
    if let Some(quality) = cli.quality {
        images.insert("quality".into(), i64::from(quality).into());
    }
    if let Some(max_edge) = cli.max_edge {
        images.insert("max_edge".into(), i64::from(max_edge).into());
    }
    if cli.keep_undecodable {
        images.insert("on_decode_failure".into(), "copy".into());
    }

    let mut archive = toml::Table::new();
    if let Some(suffix) = &cli.suffix {
        archive.insert("suffix".into(), suffix.clone().into());
    }
    if cli.skip_garbage {
        archive.insert("skip_garbage".into(), true.into());
    }

    let mut processing = toml::Table::new();
    if let Some(threads) = cli.threads {
        processing.insert(
            "max_processes".into(),
            i64::try_from(threads).unwrap_or(i64::MAX).into(),
        );
    }

    let mut root = toml::Table::new();
    for (key, table) in [
        ("images", images),
        ("archive", archive),
        ("processing", processing),
    ] {
        if !table.is_empty() {
            root.insert(key.into(), toml::Value::Table(table));
        }
    }
    toml::Value::Table(root)
}

fn summary_json(summary: &batch::BatchSummary) -> Result<String, serde_json::Error> {
    let failed: Vec<_> = summary
        .failed
        .iter()
        .map(|f| {
            serde_json::json!({
                "path": f.source,
                "stage": f.error.stage(),
                "category": f.error.category(),
                "reason": f.error.to_string(),
            })
        })
        .collect();
    serde_json::to_string(&serde_json::json!({
        "event": "summary",
        "processed": summary.processed,
        "failed": failed,
        "totals": summary.totals(),
    }))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
