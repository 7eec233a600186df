use clap::Parser;
use clipstitch_pipeline::tools::ToolMode;
use clipstitch_pipeline::{
    open_media_tools, run, ConfigOverrides, LocalFs, RunOptions, StitchConfig,
};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "clipstitch",
    about = "Organize DJI clips into YYYY/MM/DD folders, then stitch continuous recordings",
    version
)]
struct Args {
    /// Scan root (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Glob for original camera files (default: DJI_*)
    #[arg(long)]
    pattern: Option<String>,
    /// Max gap in seconds between clips of one recording (default: 30)
    #[arg(long)]
    gap: Option<f64>,
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Media backend: ffmpeg or mock
    #[arg(long)]
    tools: Option<ToolMode>,
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    #[arg(long)]
    ffprobe: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let overrides = ConfigOverrides {
        root: args.root,
        pattern: args.pattern,
        gap: args.gap,
        tool_mode: args.tools,
        ffmpeg_path: args.ffmpeg,
        ffprobe_path: args.ffprobe,
    };
    let config = match StitchConfig::resolve(args.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let tools = match open_media_tools(&config.tools, args.verbose) {
        Ok(tools) => tools,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let fs = LocalFs::new();
    match run(&RunOptions::from(&config), &fs, tools.as_ref()) {
        Ok(summary) => {
            println!("Organized {} clips.", summary.organized_count());
            for failed in &summary.failed_days {
                warn!("{} not fully processed: {}", failed.day_dir.display(), failed.error);
            }
            println!("Done: {} stitched files created.", summary.stitched());
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "clipstitch=debug,clipstitch_pipeline=debug"
    } else {
        "clipstitch=info,clipstitch_pipeline=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
