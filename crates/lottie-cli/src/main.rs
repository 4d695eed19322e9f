//! # Lottie Studio CLI
//!
//! ## Commands
//! - `inspect`: summary, layers, transform fields and colors of an animation
//! - `edit`: apply layer, color and timing edits and write the result
//! - `gif`: render an animation to a GIF file

mod args;
mod source;


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lottie_core::export::{self, GifRequest};
use lottie_core::{EditCommand, EditSession, GifRenderer, PlaybackOptions};
use lottie_render::RasterGifRenderer;
use tracing::{info, warn};

use crate::args::{ColorArg, QualityArg, TrimArg};

#[derive(Parser)]
#[command(name = "lottie-studio")]
#[command(about = "Inspect, edit and export Lottie animations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document summary, layers and editable colors
    Inspect {
        /// File path or http(s) URL
        source: String,

        /// Print the editor view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply edits and write the edited JSON
    Edit {
        /// File path or http(s) URL
        source: String,

        /// Output path for the edited JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Layer the layer edits apply to
        #[arg(short, long, default_value_t = 0)]
        layer: usize,

        /// New layer name
        #[arg(long)]
        name: Option<String>,

        /// New position as X,Y
        #[arg(long, value_parser = args::parse_pair, allow_hyphen_values = true)]
        position: Option<[f64; 2]>,

        /// New scale in percent as X,Y
        #[arg(long, value_parser = args::parse_pair, allow_hyphen_values = true)]
        scale: Option<[f64; 2]>,

        /// New rotation in degrees
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f64>,

        /// New frame rate
        #[arg(long)]
        frame_rate: Option<f64>,

        /// Trim window as START:END, relative to the original range
        #[arg(long)]
        trim: Option<TrimArg>,

        /// Color edit as PATH=#RRGGBB (repeatable)
        #[arg(long = "color")]
        colors: Vec<ColorArg>,
    },

    /// Render a GIF
    Gif {
        /// File path or http(s) URL
        source: String,

        /// Output path for the GIF
        #[arg(short, long)]
        output: PathBuf,

        /// Number of frames (10 to 100)
        #[arg(long, default_value_t = export::DEFAULT_GIF_FRAMES)]
        frames: u32,

        /// Output height in pixels
        #[arg(long, default_value_t = lottie_core::playback::DEFAULT_HEIGHT)]
        height: u32,

        /// Playback speed (0.1 to 3.0)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Play backwards
        #[arg(long)]
        reverse: bool,

        /// Play once instead of looping
        #[arg(long)]
        no_loop: bool,

        /// Encoder quality
        #[arg(long, value_enum, default_value_t = QualityArg::Low)]
        quality: QualityArg,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { source, json } => cmd_inspect(&source, json).await,
        Commands::Edit {
            source,
            output,
            layer,
            name,
            position,
            scale,
            rotation,
            frame_rate,
            trim,
            colors,
        } => {
            let commands = edit_commands(EditArgs {
                layer,
                name,
                position,
                scale,
                rotation,
                frame_rate,
                trim,
                colors,
            });
            cmd_edit(&source, &output, &commands).await
        }
        Commands::Gif {
            source,
            output,
            frames,
            height,
            speed,
            reverse,
            no_loop,
            quality,
        } => {
            let request = GifRequest {
                frames,
                playback: PlaybackOptions {
                    speed,
                    reverse,
                    looping: !no_loop,
                    quality: quality.into(),
                    height,
                },
            };
            cmd_gif(&source, &output, &request).await
        }
    }
}

/// Layer, color and timing flags of `edit`.
struct EditArgs {
    layer: usize,
    name: Option<String>,
    position: Option<[f64; 2]>,
    scale: Option<[f64; 2]>,
    rotation: Option<f64>,
    frame_rate: Option<f64>,
    trim: Option<TrimArg>,
    colors: Vec<ColorArg>,
}

fn edit_commands(args: EditArgs) -> Vec<EditCommand> {
    let layer = args.layer;
    let mut commands = Vec::new();
    if let Some(name) = args.name {
        commands.push(EditCommand::SetLayerName { layer, name });
    }
    if let Some(value) = args.position {
        commands.push(EditCommand::SetPosition { layer, value });
    }
    if let Some(value) = args.scale {
        commands.push(EditCommand::SetScale { layer, value });
    }
    if let Some(degrees) = args.rotation {
        commands.push(EditCommand::SetRotation { layer, degrees });
    }
    if let Some(fr) = args.frame_rate {
        commands.push(EditCommand::SetFrameRate { fr });
    }
    if let Some(TrimArg { start, end }) = args.trim {
        commands.push(EditCommand::Trim { start, end });
    }
    for ColorArg { path, color } in args.colors {
        commands.push(EditCommand::SetColor { layer, path, color });
    }
    commands
}

async fn cmd_inspect(source: &str, json: bool) -> Result<()> {
    let session = EditSession::new(source::load(source).await?);
    let doc = session.document();

    if json {
        let views = (0..doc.layer_count())
            .map(|index| session.view(index))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let summary = session.view(0).summary;
    println!("{}", summary.name.as_deref().unwrap_or("(unnamed animation)"));
    println!("========================");
    println!("  Version:    {}", summary.version.as_deref().unwrap_or("-"));
    println!("  Size:       {}x{}", summary.width, summary.height);
    println!("  Frame rate: {}", summary.frame_rate);
    println!("  Frames:     {} to {}", summary.in_point, summary.out_point);
    println!("  Layers:     {}", summary.layer_count);

    for index in 0..doc.layer_count() {
        let Some(layer) = session.view(index).selected else {
            continue;
        };
        println!();
        println!("[{}] {}", layer.index, layer.name);
        if let Some([x, y]) = layer.position {
            println!("  position: {}, {}", x, y);
        }
        if let Some([x, y]) = layer.scale {
            println!("  scale:    {}%, {}%", x, y);
        }
        if let Some(rotation) = layer.rotation {
            println!("  rotation: {}", rotation);
        }
        for field in &layer.animated {
            println!("  animated: {:?} (read-only)", field);
        }
        for color in &layer.colors {
            println!("  • {} {} (alpha {})", color.hex, color.label, color.alpha);
        }
        if layer.colors_truncated {
            println!("  (color list truncated)");
        }
    }
    Ok(())
}

async fn cmd_edit(source: &str, output: &Path, commands: &[EditCommand]) -> Result<()> {
    let mut session = EditSession::new(source::load(source).await?);
    let warnings = session.apply(commands)?;
    for warning in &warnings {
        warn!("{}", warning);
        eprintln!("warning: {}", warning);
    }

    let json = export::export_json(session.document())?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(commands = commands.len(), output = %output.display(), "edits written");
    println!(
        "Applied {} edit(s) with {} warning(s); wrote {}",
        commands.len(),
        warnings.len(),
        output.display()
    );
    Ok(())
}

async fn cmd_gif(source: &str, output: &Path, request: &GifRequest) -> Result<()> {
    let doc = source::load(source).await?;
    let frames = request.frame_count();
    let duration = export::gif_duration_secs(frames, doc.raw_frame_rate());
    let bytes = RasterGifRenderer.render_gif(&doc, &request.playback, duration)?;

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} ({} frames, {:.2}s, {} bytes)",
        output.display(),
        frames,
        duration,
        bytes.len()
    );
    Ok(())
}
