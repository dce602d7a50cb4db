//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for tuning
//! the reduction and scoring parameters on real documents.
//!
//! Timestamps come from a caller-supplied [`Clock`] so the library never
//! reads the system time itself. Durations are serialized as fractional
//! seconds (`f64`) for JSON compatibility, since `std::time::Duration`
//! does not implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, PipelineStage, StagedResult};
use crate::types::{PipelineConfig, PipelineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: decode, binarize, pad.
    pub decode: StageDiagnostics,
    /// Stage 2: ridge extraction and thinning.
    pub ridge_extraction: StageDiagnostics,
    /// Stage 3: iterative graph reduction.
    pub reduction: StageDiagnostics,
    /// Stage 4: junction scoring and label assignment.
    pub classification: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: Option<StageMetrics>,
}

/// Branch counts for one reduction iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationMetrics {
    /// Zero-based iteration number.
    pub iteration: usize,
    /// Branches found by the summarizer.
    pub branches_before: usize,
    /// Branches left after degree reduction.
    pub branches_after: usize,
    /// Branches whose path could not be traced.
    pub failed_traces: usize,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Decoding and binarization metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Width after border padding.
        padded_width: u32,
        /// Height after border padding.
        padded_height: u32,
        /// Paper pixels in the padded document.
        paper_pixels: usize,
    },
    /// Ridge extraction metrics.
    RidgeExtraction {
        /// Directional maxima of the distance map.
        maxima_pixels: usize,
        /// Pixels in the thinned skeleton.
        skeleton_pixels: usize,
    },
    /// Graph reduction metrics.
    Reduction {
        /// One entry per outer iteration.
        iterations: Vec<IterationMetrics>,
        /// Whether reduction reached a fixed point before the cap.
        converged: bool,
        /// Edges in the final dictionary.
        edge_count: usize,
        /// Distinct vertices in the final dictionary.
        vertex_count: usize,
        /// Vertices of degree three or more.
        junction_count: usize,
    },
    /// Classification metrics.
    Classification {
        /// Which scorer was used.
        scorer: String,
        /// Triples in the score pool.
        triples_scored: usize,
        /// Edges labelled bridge.
        bridges: usize,
        /// Edges labelled link.
        links: usize,
        /// Edges never committed.
        unlabeled: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Pixels in the initial skeleton.
    pub skeleton_pixels: usize,
    /// Edges in the final dictionary.
    pub edge_count: usize,
    /// Junctions in the final dictionary.
    pub junction_count: usize,
    /// Edges labelled bridge.
    pub bridges: usize,
    /// Edges labelled link.
    pub links: usize,
    /// Edges never committed.
    pub unlabeled: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} skeleton pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.skeleton_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Ridge Extraction", &self.ridge_extraction),
            ("Reduction", &self.reduction),
            ("Classification", &self.classification),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = diag.metrics.as_ref().map_or_else(|| "-".to_string(), format_metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Edges: {}  |  Junctions: {}  |  Bridges: {}  Links: {}  Unlabeled: {}",
            self.summary.edge_count,
            self.summary.junction_count,
            self.summary.bridges,
            self.summary.links,
            self.summary.unlabeled,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            padded_width,
            padded_height,
            ..
        } => format!(
            "{input_bytes} bytes -> {width}x{height} (padded {padded_width}x{padded_height})"
        ),
        StageMetrics::RidgeExtraction {
            maxima_pixels,
            skeleton_pixels,
        } => format!("maxima={maxima_pixels} skeleton={skeleton_pixels}"),
        StageMetrics::Reduction {
            iterations,
            converged,
            edge_count,
            junction_count,
            ..
        } => {
            let branches = iterations
                .iter()
                .map(|i| format!("{}->{}", i.branches_before, i.branches_after))
                .collect::<Vec<_>>()
                .join(",");
            let state = if *converged { "converged" } else { "capped" };
            format!(
                "iters={} [{branches}] {state} edges={edge_count} junctions={junction_count}",
                iterations.len(),
            )
        }
        StageMetrics::Classification {
            scorer,
            triples_scored,
            bridges,
            links,
            unlabeled,
        } => format!(
            "{scorer} triples={triples_scored} bridges={bridges} links={links} \
             unlabeled={unlabeled}"
        ),
    }
}

fn measure<C: Clock, S: PipelineStage>(
    clock: &C,
    start: &C::Instant,
    stage: &S,
) -> StageDiagnostics {
    StageDiagnostics {
        duration: clock.elapsed(start),
        metrics: stage.metrics(),
    }
}

/// Run every stage, timing each one with `clock`.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();

    let start = clock.now();
    let decoded = Pipeline::new(image_bytes.to_vec(), config.clone()).decode()?;
    let decode = measure(clock, &start, &decoded);

    let start = clock.now();
    let ridges = decoded.extract_ridges()?;
    let ridge_extraction = measure(clock, &start, &ridges);

    let start = clock.now();
    let reduced = ridges.reduce()?;
    let reduction = measure(clock, &start, &reduced);

    let start = clock.now();
    let classified = reduced.classify();
    let classification = measure(clock, &start, &classified);

    let staged = classified.into_result();
    let total_duration = clock.elapsed(&total_start);

    let edges = staged.edges();
    let (bridges, links, unlabeled) = staged.classification.counts(edges);
    let summary = PipelineSummary {
        image_width: staged.grayscale.width(),
        image_height: staged.grayscale.height(),
        skeleton_pixels: staged.ridges.skeleton.count(),
        edge_count: edges.len(),
        junction_count: edges.junctions().len(),
        bridges,
        links,
        unlabeled,
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        ridge_extraction,
        reduction,
        classification,
        total_duration,
        summary,
    };
    Ok((staged, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_support::grid_document_png;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn sample() -> PipelineDiagnostics {
        let stage = |ms, metrics| StageDiagnostics {
            duration: Duration::from_millis(ms),
            metrics: Some(metrics),
        };
        PipelineDiagnostics {
            decode: stage(
                10,
                StageMetrics::Decode {
                    input_bytes: 1000,
                    width: 100,
                    height: 80,
                    padded_width: 160,
                    padded_height: 140,
                    paper_pixels: 20_000,
                },
            ),
            ridge_extraction: stage(
                20,
                StageMetrics::RidgeExtraction {
                    maxima_pixels: 900,
                    skeleton_pixels: 400,
                },
            ),
            reduction: stage(
                30,
                StageMetrics::Reduction {
                    iterations: vec![IterationMetrics {
                        iteration: 0,
                        branches_before: 12,
                        branches_after: 8,
                        failed_traces: 0,
                    }],
                    converged: true,
                    edge_count: 8,
                    vertex_count: 5,
                    junction_count: 5,
                },
            ),
            classification: stage(
                40,
                StageMetrics::Classification {
                    scorer: "Global".to_string(),
                    triples_scored: 16,
                    bridges: 2,
                    links: 6,
                    unlabeled: 0,
                },
            ),
            total_duration: Duration::from_millis(100),
            summary: PipelineSummary {
                image_width: 100,
                image_height: 80,
                skeleton_pixels: 400,
                edge_count: 8,
                junction_count: 5,
                bridges: 2,
                links: 6,
                unlabeled: 0,
            },
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample().report();
        assert!(report.starts_with("Pipeline Diagnostics Report"));
        for name in ["Decode", "Ridge Extraction", "Reduction", "Classification"] {
            assert!(report.contains(name), "missing {name}");
        }
        assert!(report.contains("iters=1 [12->8] converged"));
        assert!(report.contains("Bridges: 2  Links: 6"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.1).abs() < 1e-9);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.decode.duration, Duration::from_millis(10));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<PipelineDiagnostics>(json).is_err());
    }

    #[test]
    fn full_run_collects_every_stage() {
        let clock = TickClock(Cell::new(0));
        let config = PipelineConfig::default();
        let (staged, diagnostics) =
            process_staged_with_diagnostics(&grid_document_png(), &config, &clock).unwrap();
        assert_eq!(diagnostics.summary.edge_count, staged.edges().len());
        assert!(matches!(diagnostics.decode.metrics, Some(StageMetrics::Decode { .. })));
        assert!(matches!(
            diagnostics.classification.metrics,
            Some(StageMetrics::Classification { .. })
        ));
        // Each stage spans exactly one clock reading.
        assert_eq!(diagnostics.reduction.duration, Duration::from_millis(1));
        assert!(diagnostics.total_duration >= Duration::from_millis(4));
    }

    #[test]
    fn failing_stage_propagates_its_error() {
        let clock = TickClock(Cell::new(0));
        let result = process_staged_with_diagnostics(&[], &PipelineConfig::default(), &clock);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
