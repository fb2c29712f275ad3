//! `ember` - render a built-in scene to PNG.
//!
//! ```text
//! ember [--scene cornell|spheres] [--mode raycast|path] [--config file.json]
//!       [--spp N] [--threads N] [--seed N] [--output out.png]
//! ```

mod scenes;

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{anyhow, bail, Context, Result};
use ember_renderer::{render, PixelBuffer, RenderConfig, RenderMode};

const USAGE: &str = "Usage: ember [--scene cornell|spheres] [--mode raycast|path] \
[--config file.json] [--spp N] [--threads N] [--seed N] [--output out.png]";

/// Command line options. Flags override values from `--config`.
#[derive(Debug, Clone, PartialEq)]
struct Args {
    scene: String,
    mode: Option<RenderMode>,
    config: Option<PathBuf>,
    spp: Option<u32>,
    threads: Option<usize>,
    seed: Option<u64>,
    output: PathBuf,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            scene: "cornell".to_string(),
            mode: None,
            config: None,
            spp: None,
            threads: None,
            seed: None,
            output: PathBuf::from("ember.png"),
        }
    }
}

/// `Ok(None)` means help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        if flag == "-h" || flag == "--help" {
            return Ok(None);
        }
        let value = args
            .next()
            .ok_or_else(|| anyhow!("missing value for {flag}"))?;
        match flag.as_str() {
            "--scene" => parsed.scene = value,
            "--mode" => parsed.mode = Some(value.parse()?),
            "--config" => parsed.config = Some(PathBuf::from(value)),
            "--spp" => parsed.spp = Some(value.parse().with_context(|| format!("--spp {value}"))?),
            "--threads" => {
                parsed.threads = Some(value.parse().with_context(|| format!("--threads {value}"))?)
            }
            "--seed" => parsed.seed = Some(value.parse().with_context(|| format!("--seed {value}"))?),
            "--output" | "-o" => parsed.output = PathBuf::from(value),
            other => bail!("unknown flag '{other}'\n{USAGE}"),
        }
    }
    Ok(Some(parsed))
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn apply_overrides(mut config: RenderConfig, args: &Args) -> RenderConfig {
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(spp) = args.spp {
        config.path.samples_per_pixel = Some(spp);
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config
}

fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8())
        .ok_or_else(|| anyhow!("pixel buffer does not match its dimensions"))?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let Some(args) = parse_args(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    let mut scene = scenes::build(&args.scene)?;

    let output = render(&mut scene, &config).context("render failed")?;
    save_png(&output.pixels, &args.output)?;

    println!("{}", output.report);
    println!("Wrote {}", args.output.display());
    Ok(())
}
