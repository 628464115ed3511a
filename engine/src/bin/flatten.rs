use clap::Parser;
use log::{error, info};
use psd_viewer::{ExportMode, OutlineEntry, Viewer, ViewerConfig, ViewerError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Flattens an exported layered document (JSON with embedded layer images) into a PNG.
#[derive(Parser, Debug)]
#[command(name = "flatten", version)]
struct Args {
    /// Exported document (`{ width, height, descendants }`).
    input: PathBuf,
    /// Output PNG. Defaults to the input name with a `.png` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Render only the subtree rooted at this node index.
    #[arg(long)]
    node: Option<usize>,
    /// JSON viewer configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the layer outline instead of writing an image.
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ViewerError> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_json(&read(path)?)?,
        None => ViewerConfig::default(),
    };
    // Writing a file needs the encoded bytes, not a URL.
    config.export_mode = ExportMode::ObjectUrl;
    let mut viewer = Viewer::from_json(&read(&args.input)?, &config)?;

    if args.list {
        for entry in viewer.outline() {
            println!("{}", outline_line(&entry));
        }
        return Ok(());
    }

    let handle = match args.node {
        Some(index) => viewer.node_image(index)?,
        None => viewer.flattened_image()?,
    };
    let bytes = viewer.image_bytes(&handle).ok_or_else(|| ViewerError::resource("exported image is no longer available"))?;

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    std::fs::write(&output, bytes).map_err(|e| ViewerError::resource(format!("{}: {}", output.display(), e)))?;
    info!("wrote {}", output.display());
    viewer.clear();
    Ok(())
}

/// `*` marks visible nodes, `+` groups and `-` layers.
fn outline_line(entry: &OutlineEntry) -> String {
    format!(
        "{}{} {} [{}] {} {}% {}",
        "  ".repeat(entry.depth),
        if entry.visible { "*" } else { " " },
        if entry.is_group { "+" } else { "-" },
        entry.index,
        entry.name,
        entry.opacity_percent,
        entry.blend_mode,
    )
}

fn read(path: &Path) -> Result<String, ViewerError> {
    std::fs::read_to_string(path).map_err(|e| ViewerError::resource(format!("{}: {}", path.display(), e)))
}

fn default_output(input: &Path) -> PathBuf {
    let name = input.file_name().and_then(|n| n.to_str()).map(psd_viewer::viewer::image_name).unwrap_or("flattened");
    input.with_file_name(format!("{}.png", name))
}
