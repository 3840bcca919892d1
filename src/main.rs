use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use prismal_glass::{
    BackgroundImage, GlassSurfaceParameters, params,
    glass::cpu::render_cpu,
    renderer::{self, GpuContext, GpuGlassSurface},
    surface::{FrameSnapshot, render_once},
};
use tracing::{info, warn};

const USAGE: &str = "usage: prismal-glass --output <png> [--background <image>] [--params <json>] \
[--viewport WxH] [--backend cpu|gpu] [--show-normals]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Backend {
    Cpu,
    #[default]
    Gpu,
}

#[derive(Debug, Default, Clone)]
struct Cli {
    background: Option<PathBuf>,
    params: Option<PathBuf>,
    output: Option<PathBuf>,
    viewport: Option<(u32, u32)>,
    backend: Backend,
    show_normals: bool,
    help: bool,
}

fn parse_viewport(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("--viewport expects WxH, got {s:?}"))?;
    let w: u32 = w
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid viewport width {w:?}: {e}"))?;
    let h: u32 = h
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid viewport height {h:?}: {e}"))?;
    Ok((w, h))
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let value = |name: &str| {
            args.get(i + 1)
                .ok_or_else(|| anyhow!("missing value for {name}"))
        };
        match args[i].as_str() {
            "--background" => {
                cli.background = Some(PathBuf::from(value("--background")?));
                i += 2;
            }
            "--params" => {
                cli.params = Some(PathBuf::from(value("--params")?));
                i += 2;
            }
            "--output" | "-o" => {
                cli.output = Some(PathBuf::from(value("--output")?));
                i += 2;
            }
            "--viewport" => {
                cli.viewport = Some(parse_viewport(value("--viewport")?)?);
                i += 2;
            }
            "--backend" => {
                cli.backend = match value("--backend")?.as_str() {
                    "cpu" => Backend::Cpu,
                    "gpu" => Backend::Gpu,
                    other => bail!("unknown backend {other:?} (supported: cpu, gpu)"),
                };
                i += 2;
            }
            "--show-normals" => {
                cli.show_normals = true;
                i += 1;
            }
            "--help" | "-h" => {
                cli.help = true;
                i += 1;
            }
            other => {
                return Err(anyhow!("unknown argument: {other}\n{USAGE}"));
            }
        }
    }
    Ok(cli)
}

/// Viewport defaults to the glass footprint, rounded up to whole pixels.
///
/// Never empty, so a degenerate glass still gets a (transparent) image.
fn default_viewport(params: &GlassSurfaceParameters) -> (u32, u32) {
    let side = |v: f32| (v.ceil() as u32).max(1);
    (side(params.width), side(params.height))
}

fn render_gpu_or_fallback(snapshot: &FrameSnapshot) -> Result<image::RgbaImage> {
    let ctx = match GpuContext::new_headless() {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "GPU unavailable; falling back to the CPU renderer");
            return Ok(render_cpu(snapshot));
        }
    };
    let mut surface = GpuGlassSurface::new(ctx);
    render_once(&mut surface, snapshot)?
        .ok_or_else(|| anyhow!("GPU backend skipped a non-degenerate frame"))
}

fn run(cli: Cli, output: &Path) -> Result<()> {
    let mut params = match cli.params.as_deref() {
        Some(path) => params::load_params_from_path(path)?,
        None => GlassSurfaceParameters::default(),
    };
    if cli.show_normals {
        params.show_normals = true;
    }

    let viewport = cli.viewport.unwrap_or_else(|| default_viewport(&params));
    if viewport.0 == 0 || viewport.1 == 0 {
        bail!("viewport {}x{} has no pixels", viewport.0, viewport.1);
    }

    let background = match cli.background.as_deref() {
        Some(path) => BackgroundImage::load(path)?,
        None => {
            info!("no --background given; using the placeholder");
            BackgroundImage::placeholder(viewport)
        }
    };

    let snapshot = FrameSnapshot::new(params.clone(), background, viewport);
    for adjustment in params.resolve().1 {
        warn!("{adjustment}");
    }

    let image = if snapshot.is_degenerate() {
        warn!(
            width = params.width,
            height = params.height,
            "glass has no area; writing a transparent frame"
        );
        render_cpu(&snapshot)
    } else {
        match cli.backend {
            Backend::Cpu => render_cpu(&snapshot),
            Backend::Gpu => render_gpu_or_fallback(&snapshot)?,
        }
    };

    renderer::save_png(&image, output)?;
    println!("[headless] saved: {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    if cli.help {
        println!("{USAGE}");
        return Ok(());
    }
    let Some(output) = cli.output.clone() else {
        bail!("--output <png> is required\n{USAGE}");
    };
    run(cli, &output)
}
