use std::path::PathBuf;

use clap::Parser;
use toolpathkit::{init_logging, ArtifactLoader, Config, BUILD_DATE, VERSION};
use tracing::{error, info};

/// Load and summarize toolpath result files
#[derive(Parser, Debug)]
#[command(name = "toolpathkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Result files, relative to the configured data directory
    #[arg(required = true)]
    files: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let config = Config::load_or_default(&config_path)?;
    init_logging(&config.logging)?;
    info!(version = VERSION, build = BUILD_DATE, config = %config_path.display(), "ToolpathKit");

    let loader = ArtifactLoader::from_data_dir(config.paths.data_dir.clone());
    let mut failures = 0usize;
    for file in cli.files {
        match loader.load(&file).await {
            Ok(artifact) => {
                let geometry = &artifact.geometry;
                let feeds = geometry.feed_segments().count();
                println!(
                    "{}: {} {} segments ({} feed, {} rapid), {:.1} mm cut, ~{:.0}s",
                    file,
                    geometry.head_type,
                    geometry.segments.len(),
                    feeds,
                    geometry.segments.len() - feeds,
                    geometry.feed_length(),
                    geometry.estimated_time
                );
                if let Some(bounds) = geometry.bounds {
                    println!(
                        "  bounds: {:.2} x {:.2} mm at ({:.2}, {:.2})",
                        bounds.width(),
                        bounds.height(),
                        bounds.min.x,
                        bounds.min.y
                    );
                }
            }
            Err(e) => {
                error!(file = %file, error = %e, "Cannot load tool path file");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} file(s) could not be loaded", failures);
    }
    Ok(())
}
