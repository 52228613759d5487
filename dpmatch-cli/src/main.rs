use clap::Parser;
use dpmatch::image::io::{load_rgb_image, save_rgb_image};
use dpmatch::{Band, FusionConfig, Matcher, StereoConfig};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "dpmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    Stereo,
    Fusion,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StereoConfigJson {
    skip: i32,
    weight: f64,
    row_range: i32,
    threshold: u8,
    max_disparity: i32,
}

impl Default for StereoConfigJson {
    fn default() -> Self {
        let cfg = StereoConfig::default();
        Self {
            skip: cfg.skip,
            weight: cfg.weight,
            row_range: cfg.row_range,
            threshold: cfg.threshold,
            max_disparity: cfg.max_disparity,
        }
    }
}

impl From<StereoConfigJson> for StereoConfig {
    fn from(value: StereoConfigJson) -> Self {
        Self {
            skip: value.skip,
            weight: value.weight,
            row_range: value.row_range,
            threshold: value.threshold,
            max_disparity: value.max_disparity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FusionConfigJson {
    skip: i32,
    sigma_c: f64,
    sigma_g: f64,
    left_range: i32,
    right_range: i32,
}

impl Default for FusionConfigJson {
    fn default() -> Self {
        let cfg = FusionConfig::default();
        Self {
            skip: cfg.skip,
            sigma_c: cfg.sigma_c,
            sigma_g: cfg.sigma_g,
            left_range: cfg.band.left,
            right_range: cfg.band.right,
        }
    }
}

impl From<FusionConfigJson> for FusionConfig {
    fn from(value: FusionConfigJson) -> Self {
        Self {
            skip: value.skip,
            sigma_c: value.sigma_c,
            sigma_g: value.sigma_g,
            band: Band {
                left: value.left_range,
                right: value.right_range,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    input_path: String,
    reference_path: String,
    output_path: String,
    /// 0 selects the machine's available parallelism.
    threads: usize,
    mode: ModeConfig,
    stereo: StereoConfigJson,
    fusion: FusionConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            reference_path: String::new(),
            output_path: "out.bmp".to_string(),
            threads: 0,
            mode: ModeConfig::Stereo,
            stereo: StereoConfigJson::default(),
            fusion: FusionConfigJson::default(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("dpmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() || config.reference_path.is_empty() {
        return Err("input_path and reference_path must be set in the config".into());
    }

    let input = load_rgb_image(&config.input_path)?;
    let reference = load_rgb_image(&config.reference_path)?;

    let mut matcher = if config.threads == 0 {
        Matcher::new(input, reference)?
    } else {
        Matcher::with_threads(input, reference, config.threads)?
    };

    let started = std::time::Instant::now();
    let rendered = match config.mode {
        ModeConfig::Stereo => {
            let cfg: StereoConfig = config.stereo.into();
            let max_disparity = cfg.max_disparity;
            matcher.stereo(cfg)?;
            matcher.disparity_image(max_disparity)?
        }
        ModeConfig::Fusion => {
            matcher.fusion(config.fusion.into())?;
            matcher.fused_image()?
        }
    };
    eprintln!(
        "matched {} scanlines in {} ms",
        matcher.input().height(),
        started.elapsed().as_millis()
    );

    save_rgb_image(&config.output_path, &rendered)?;
    Ok(())
}
