//! strokegraph-bench: CLI tool for running the junction classifier over
//! documents and inspecting per-stage diagnostics.
//!
//! Runs the pipeline on one image or every image in a directory, prints
//! the diagnostics report for each, and optionally writes the edge
//! dictionary, classification renderings and per-iteration reduction
//! images. Useful for:
//!
//! - Comparing the global and local junction scorers
//! - Tuning the nearby-sample ring radius
//! - Watching how many reduction iterations a document needs
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin strokegraph-bench -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use strokegraph_pipeline::diagnostics::{
    Clock, PipelineDiagnostics, process_staged_with_diagnostics,
};
use strokegraph_pipeline::{JunctionScorerKind, PipelineConfig, RgbImage, StagedResult};
use tracing_subscriber::EnvFilter;

/// Junction classification diagnostics for scanned documents.
///
/// Reduces each document's ridge skeleton to a junction graph, labels
/// every junction edge as a bridge or a link, and prints per-stage
/// timing and count diagnostics.
#[derive(Parser)]
#[command(name = "strokegraph-bench", version)]
struct Cli {
    /// Input image (PNG, JPEG, BMP, WebP) or a directory of images.
    input: PathBuf,

    /// Chebyshev radius of the nearby-sample ring around each junction.
    #[arg(
        long,
        default_value_t = PipelineConfig::DEFAULT_RING_RADIUS,
        value_parser = at_least_one(),
    )]
    ring_radius: usize,

    /// Junction scoring strategy.
    #[arg(long, value_enum, default_value_t = Scorer::Global)]
    scorer: Scorer,

    /// Upper bound on graph reduction iterations.
    #[arg(
        long,
        default_value_t = PipelineConfig::DEFAULT_MAX_REDUCTION_ITERATIONS,
        value_parser = at_least_one(),
    )]
    max_reduction_iterations: usize,

    /// Background border added around the document before ridge extraction.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BORDER_PADDING)]
    border_padding: u32,

    /// Write per-image exports into `<OUT_DIR>/<image stem>/`.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Number of runs per image for averaging.
    #[arg(long, default_value_t = 1, value_parser = at_least_one())]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,
}

/// Junction scorer selection.
#[derive(Clone, Copy, ValueEnum)]
enum Scorer {
    /// Best of exact endpoints and nearby ring samples.
    Global,
    /// Exact endpoints only.
    Local,
}

/// File extensions picked up when the input is a directory.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Parser for counts that must be positive.
fn at_least_one() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PipelineConfig {
            ring_radius: cli.ring_radius,
            scorer: match cli.scorer {
                Scorer::Global => JunctionScorerKind::Global,
                Scorer::Local => JunctionScorerKind::Local,
            },
            max_reduction_iterations: cli.max_reduction_iterations,
            border_padding: cli.border_padding,
            ..PipelineConfig::default()
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// The images to process: the input itself, or every image file in it
/// sorted by name.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, String> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let entries =
        std::fs::read_dir(input).map_err(|e| format!("Error reading {}: {e}", input.display()))?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                    })
        })
        .collect();
    images.sort();
    Ok(images)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let images = match collect_inputs(&cli.input) {
        Ok(images) if images.is_empty() => {
            eprintln!("No images found in {}", cli.input.display());
            return ExitCode::FAILURE;
        }
        Ok(images) => images,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Config: {config:#?}");
    eprintln!("Images: {}  Runs: {}", images.len(), cli.runs);
    eprintln!();

    let mut failures = 0;
    for image_path in &images {
        if let Err(msg) = run_image(&cli, &config, image_path) {
            eprintln!("{}: {msg}", image_path.display());
            failures += 1;
        }
        eprintln!();
    }

    if failures == images.len() {
        ExitCode::FAILURE
    } else {
        if failures > 0 {
            eprintln!("{failures} of {} images failed", images.len());
        }
        ExitCode::SUCCESS
    }
}

/// Process one image `cli.runs` times, printing diagnostics and writing
/// exports from the first run.
fn run_image(cli: &Cli, config: &PipelineConfig, image_path: &Path) -> Result<(), String> {
    let image_bytes =
        std::fs::read(image_path).map_err(|e| format!("Error reading image: {e}"))?;
    eprintln!("Image: {} ({} bytes)", image_path.display(), image_bytes.len());

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (staged, diagnostics) =
            process_staged_with_diagnostics(&image_bytes, config, &StdClock)
                .map_err(|e| format!("Pipeline error: {e}"))?;

        if cli.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }

        if run == 0
            && let Some(ref out_dir) = cli.out_dir
        {
            let stem = image_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image");
            write_exports(&out_dir.join(stem), stem, config, &staged)?;
        }

        all_diagnostics.push(diagnostics);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }
    Ok(())
}

/// Write the edge dictionary and every rendering into `dir`.
fn write_exports(
    dir: &Path,
    title: &str,
    config: &PipelineConfig,
    staged: &StagedResult,
) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let edges = staged.edges();
    let classification = &staged.classification;

    let json = strokegraph_export::to_json(edges, classification, staged.dimensions)
        .map_err(|e| e.to_string())?;
    write_file(&dir.join("edges.json"), json.as_bytes())?;

    let config_json = serde_json::to_string(config).map_err(|e| e.to_string())?;
    let description = format!("{config:?}");
    let metadata = strokegraph_export::SvgMetadata {
        title: Some(title),
        description: Some(&description),
        config_json: Some(&config_json),
    };
    let svg = strokegraph_export::to_svg(edges, classification, staged.dimensions, &metadata);
    write_file(&dir.join("classifications.svg"), svg.as_bytes())?;

    for (name, image) in renderings(staged) {
        let png = strokegraph_export::encode_png(&image).map_err(|e| e.to_string())?;
        write_file(&dir.join(name), &png)?;
    }

    eprintln!("Exports written to {}", dir.display());
    Ok(())
}

/// Every PNG rendering of a run, keyed by file name.
///
/// Each reduction iteration `i` contributes `skel_i.png` (its skeleton),
/// `base_i.png` (the skeleton with vertex neighbourhoods cleared) and
/// `iter_i.png` (its traced branches).
fn renderings(staged: &StagedResult) -> Vec<(String, RgbImage)> {
    let edges = staged.edges();
    let classification = &staged.classification;
    let mut images = vec![
        (
            "classifications.png".to_owned(),
            strokegraph_export::render_classification(edges, classification, staged.dimensions),
        ),
        (
            "overlayed_classifications.png".to_owned(),
            strokegraph_export::render_overlay(edges, classification, &staged.binary),
        ),
        (
            "edges.png".to_owned(),
            strokegraph_export::render_edges(edges, staged.dimensions),
        ),
    ];
    for snapshot in &staged.reduction.snapshots {
        let i = snapshot.iteration;
        let rendered = strokegraph_export::render_snapshot(snapshot);
        images.push((format!("skel_{i}.png"), rendered.skeleton));
        images.push((format!("base_{i}.png"), rendered.disconnected));
        images.push((format!("iter_{i}.png"), rendered.traced));
    }
    images
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), String> {
    std::fs::write(path, contents).map_err(|e| format!("Error writing {}: {e}", path.display()))
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| d.decode.duration),
        ("Ridge Extraction", |d| d.ridge_extraction.duration),
        ("Reduction", |d| d.reduction.duration),
        ("Classification", |d| d.classification.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("strokegraph-bench").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_build_a_config() {
        let cli = parse(&["doc.png", "--ring-radius", "3", "--scorer", "local"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.ring_radius, 3);
        assert_eq!(config.scorer, JunctionScorerKind::Local);
        assert_eq!(config.border_padding, PipelineConfig::DEFAULT_BORDER_PADDING);
    }

    #[test]
    fn defaults_match_the_library() {
        let cli = parse(&["doc.png"]);
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "doc.png",
            "--ring-radius",
            "3",
            "--config-json",
            r#"{"ring_radius": 9}"#,
        ]);
        assert_eq!(config_from_cli(&cli).unwrap().ring_radius, 9);
    }

    #[test]
    fn invalid_config_json_is_reported() {
        let cli = parse(&["doc.png", "--config-json", r#"{"ring_radius": 0}"#]);
        assert!(config_from_cli(&cli).unwrap_err().contains("ring_radius"));
    }

    /// White 49x49 page with four black squares in a 2x2 layout.
    fn grid_document_png() -> Vec<u8> {
        let ink = |v: u32| (6..20).contains(&v) || (29..43).contains(&v);
        let mut raw = Vec::with_capacity(49 * 49 * 3);
        for y in 0..49 {
            for x in 0..49 {
                let value = if ink(x) && ink(y) { 0 } else { 255 };
                raw.extend([value; 3]);
            }
        }
        let page = RgbImage::from_raw(49, 49, raw).unwrap();
        strokegraph_export::encode_png(&page).unwrap()
    }

    #[test]
    fn renderings_cover_every_reduction_iteration() {
        let config = PipelineConfig::default();
        let staged = strokegraph_pipeline::process_staged(&grid_document_png(), &config).unwrap();
        let images = renderings(&staged);
        let names: Vec<&str> = images.iter().map(|(name, _)| name.as_str()).collect();

        let iterations = staged.reduction.snapshots.len();
        assert!(iterations >= 1);
        assert_eq!(images.len(), 3 + 3 * iterations);
        for name in ["classifications.png", "overlayed_classifications.png", "edges.png"] {
            assert!(names.contains(&name), "missing {name}");
        }
        for i in 0..iterations {
            for prefix in ["skel", "base", "iter"] {
                let name = format!("{prefix}_{i}.png");
                assert!(names.contains(&name.as_str()), "missing {name}");
            }
        }
        let (width, height) = (staged.dimensions.width, staged.dimensions.height);
        assert!(images.iter().all(|(_, img)| img.dimensions() == (width, height)));
    }

    #[test]
    fn zero_ring_radius_flag_is_rejected_by_clap() {
        let result =
            Cli::try_parse_from(["strokegraph-bench", "doc.png", "--ring-radius", "0"]);
        assert!(result.is_err());
    }
}
