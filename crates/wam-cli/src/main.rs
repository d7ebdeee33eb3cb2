//! `wam`: headless checks and exports for WAM diagram documents.

mod diagnostics;
mod outline;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use wam_core::{Bounds, DiagramDocument, LinkKind, SceneGraph, ShapeFactory, ShapeKind};
use wam_render::{CanvasTheme, RenderOptions, Viewport, render_png, render_svg};

#[derive(Parser)]
#[command(name = "wam")]
#[command(about = "Inspect, validate and export WAM diagram documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the embedding tree of a document
    Inspect {
        file: PathBuf,
    },

    /// Check a document; exits non-zero if it cannot be imported
    Validate {
        file: PathBuf,
        /// Treat property warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Render a document to SVG and/or PNG
    Export {
        file: PathBuf,
        #[arg(long)]
        svg: Option<PathBuf>,
        #[arg(long)]
        png: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
        theme: ThemeArg,
        /// Blank border around the content, in pixels
        #[arg(long, default_value_t = 20.0)]
        margin: f64,
    },

    /// List the shape and link types and their properties
    Catalogue,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file } => inspect(&file),
        Commands::Validate { file, strict } => validate(&file, strict),
        Commands::Export {
            file,
            svg,
            png,
            theme,
            margin,
        } => export(&file, svg.as_deref(), png.as_deref(), theme, margin),
        Commands::Catalogue => {
            print!("{}", catalogue());
            Ok(())
        }
    }
}

fn load(file: &Path) -> Result<(DiagramDocument, SceneGraph)> {
    let text =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let document = DiagramDocument::from_json(&text)
        .with_context(|| format!("importing {}", file.display()))?;
    let scene = document.to_scene()?;
    log::debug!("loaded {} cells from {}", scene.len(), file.display());
    Ok((document, scene))
}

fn inspect(file: &Path) -> Result<()> {
    let (document, scene) = load(file)?;
    println!("{} ({} cells)", document.title, scene.len());
    print!("{}", outline::format_outline(&outline::compute_outline(&scene)));
    Ok(())
}

fn validate(file: &Path, strict: bool) -> Result<()> {
    let text =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let diags = diagnostics::check_document(&text);
    for d in &diags {
        eprintln!("{}: {d}", file.display());
    }
    if diagnostics::has_errors(&diags) || (strict && !diags.is_empty()) {
        bail!("{} problem(s) in {}", diags.len(), file.display());
    }
    println!("{}: ok", file.display());
    Ok(())
}

fn export(
    file: &Path,
    svg: Option<&Path>,
    png: Option<&Path>,
    theme: ThemeArg,
    margin: f64,
) -> Result<()> {
    if svg.is_none() && png.is_none() {
        bail!("nothing to export: pass --svg and/or --png");
    }
    let (_, scene) = load(file)?;
    let registry = ShapeFactory::default().registry().clone();
    let options = RenderOptions {
        theme: match theme {
            ThemeArg::Light => CanvasTheme::light(),
            ThemeArg::Dark => CanvasTheme::dark(),
        },
        viewport: fit_to_content(&scene, margin),
        decorations: Vec::new(),
    };

    if let Some(path) = svg {
        std::fs::write(path, render_svg(&scene, &registry, &options))
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = png {
        let bytes = render_png(&scene, &registry, &options)?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// A 100% viewport whose surface just covers the content plus `margin`.
fn fit_to_content(scene: &SceneGraph, margin: f64) -> Viewport {
    let content = Bounds::union_all(scene.ids().iter().filter_map(|id| scene.bounds_of(*id).ok()))
        .unwrap_or_default();
    // Content left of or above the origin is shifted into view.
    let shift = |min: f64| if min < 0.0 { margin - min } else { 0.0 };
    let pan = wam_core::Point::new(shift(content.x), shift(content.y));
    let mut viewport = Viewport::new(
        (content.right() + pan.x + margin).ceil().max(1.0),
        (content.bottom() + pan.y + margin).ceil().max(1.0),
    );
    viewport.set_pan(pan);
    viewport
}

fn catalogue() -> String {
    let registry = ShapeFactory::default().registry().clone();
    let mut out = String::from("Shapes:\n");
    for kind in ShapeKind::ALL {
        let Some(template) = registry.shape(kind) else {
            continue;
        };
        let container = if kind.is_container() { ", container" } else { "" };
        out.push_str(&format!(
            "  {kind} ({}x{}{container})\n",
            template.size.width, template.size.height
        ));
        for (key, prop) in &template.data.props {
            out.push_str(&format!("    {key}: {:?}\n", prop.kind()));
        }
    }
    out.push_str("Links:\n");
    for kind in LinkKind::ALL {
        if let Some(template) = registry.link(kind) {
            out.push_str(&format!("  {kind}\n"));
            for (key, prop) in &template.data.props {
                out.push_str(&format!("    {key}: {:?}\n", prop.kind()));
            }
        }
    }
    out
}
