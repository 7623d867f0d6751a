use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tachyon::library::Library;
use tachyon::output::{self, FileRewrite};
use tachyon::rewrite::Rewriter;
use tachyon::sizing::SizeRequest;
use tachyon::{config, naming};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "tachyon")]
#[command(about = "Serve WordPress images through a Tachyon image CDN")]
#[command(long_about = "\
Serve WordPress images through a Tachyon image CDN

Rewrites rendered post markup so that every uploaded image is requested from
the CDN at the size the page asked for, instead of from a pre-generated file.

  <img class=\"wp-image-42 size-medium\" src=\".../uploads/photo-300x169.jpg\">
    → <img class=\"wp-image-42 size-medium\" src=\"https://cdn/photo.jpg?fit=300,169\">

Attachment ids and master dimensions come from a library manifest
(library.json), built from an uploads directory with 'tachyon scan'.

Size inference (first match wins):
  size-NAME class on the <img> or its <figure>
  -WxH filename suffix (a crop when a cropping size has exactly that box)
  full-size image

Run 'tachyon gen-config' to generate a documented tachyon.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Media library manifest
    #[arg(long, default_value = "library.json", global = true)]
    library: PathBuf,

    /// Log skipped images and size resolution (-vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the CDN URL for one attachment
    Url(UrlArgs),
    /// Rewrite image URLs in HTML files (or stdin)
    Rewrite(RewriteArgs),
    /// List the registered image sizes
    Sizes,
    /// Build a library manifest from a WordPress uploads directory
    Scan {
        /// The uploads directory (wp-content/uploads)
        uploads: PathBuf,
    },
    /// Print a stock tachyon.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct UrlArgs {
    /// Attachment id
    id: u64,

    /// Registered size name, or `full`
    #[arg(long, conflicts_with_all = ["width", "height", "crop"])]
    size: Option<String>,

    /// Maximum width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Maximum height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Fill the box exactly instead of fitting inside it
    #[arg(long)]
    crop: bool,

    /// Scale each axis independently instead of fitting a box
    #[arg(long, conflicts_with_all = ["size", "crop"])]
    scale: bool,
}

#[derive(Args)]
struct RewriteArgs {
    /// HTML files or directories (reads stdin when omitted)
    paths: Vec<PathBuf>,

    /// Write results back to the files instead of stdout
    #[arg(long, requires = "paths")]
    in_place: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Url(args) => {
            let config = config::load_config(&cli.config)?;
            let rewriter = Rewriter::new(
                Library::load(&cli.library)?,
                config.size_table(),
                config.urls()?,
            );
            let src = if args.scale {
                rewriter.scaled_url_for(args.id, args.width, args.height)
            } else {
                rewriter.url_for(args.id, &url_request(&args))
            };
            let src = src.ok_or_else(|| format!("unknown attachment {}", args.id))?;
            output::print_image_src(&src);
        }
        Command::Rewrite(args) => {
            let config = config::load_config(&cli.config)?;
            let rewriter = Rewriter::new(
                Library::load(&cli.library)?,
                config.size_table(),
                config.urls()?,
            );
            init_thread_pool(&config.processing);

            if args.paths.is_empty() {
                let mut markup = String::new();
                std::io::stdin().read_to_string(&mut markup)?;
                std::io::stdout().write_all(rewriter.rewrite(&markup).as_bytes())?;
            } else {
                rewrite_files(&rewriter, &args.paths, args.in_place)?;
            }
        }
        Command::Sizes => {
            let config = config::load_config(&cli.config)?;
            output::print_sizes(&config.size_table());
        }
        Command::Scan { uploads } => {
            let library = Library::scan(&uploads)?;
            library.save(&cli.library)?;
            output::print_library(&library);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the `tracing` subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "tachyon=debug",
        _ => "tachyon=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn url_request(args: &UrlArgs) -> SizeRequest {
    match &args.size {
        Some(name) => SizeRequest::named(name),
        None => SizeRequest::Explicit {
            width: args.width,
            height: args.height,
            crop: args.crop,
        },
    }
}

/// Rewrite files in parallel. Without `in_place` the results go to stdout in
/// argument order; with it, changed files are written back and summarized.
fn rewrite_files<L, S>(
    rewriter: &Rewriter<L, S>,
    paths: &[PathBuf],
    in_place: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    L: tachyon::library::MediaLibrary,
    S: tachyon::sizing::SizeTable,
{
    let files = collect_html_files(paths)?;
    debug!(files = files.len(), "rewriting");

    let results = files
        .par_iter()
        .map(|path| -> std::io::Result<(FileRewrite, String)> {
            let markup = std::fs::read_to_string(path)?;
            let rewritten = rewriter.rewrite(&markup);
            let changed = rewritten != markup;
            if in_place && changed {
                std::fs::write(path, &rewritten)?;
            }
            Ok((
                FileRewrite {
                    path: path.clone(),
                    changed,
                },
                rewritten,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if in_place {
        let summary: Vec<FileRewrite> = results.into_iter().map(|(file, _)| file).collect();
        output::print_rewrite_summary(&summary);
    } else {
        let mut stdout = std::io::stdout().lock();
        for (_, rewritten) in results {
            stdout.write_all(rewritten.as_bytes())?;
        }
    }
    Ok(())
}

/// Expand directories into the HTML files beneath them, sorted by name.
/// Files given explicitly are kept whatever their extension.
fn collect_html_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_html(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| naming::HTML_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
