//! Audio filter graph construction.
//!
//! Each item compiles to at most one fragment of the form
//! `[N:a]step[stepN_1];[stepN_1]step[aN]`. Items without steps produce no
//! fragment and are mapped from their raw input stream.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::MergeItem;

/// Tolerance under which a speed factor counts as identity.
const SPEED_EPSILON: f64 = 1e-6;

/// A primitive audio operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterStep {
    /// Drop everything before `start_secs` and restart timestamps at zero.
    Trim { start_secs: f64 },
    /// Linear speed change by `factor`.
    Tempo { factor: f64 },
}

impl FilterStep {
    /// ffmpeg filter chain text for this step, without labels.
    pub fn render(&self) -> String {
        match self {
            FilterStep::Trim { start_secs } => {
                format!("atrim=start={start_secs},asetpts=PTS-STARTPTS")
            }
            FilterStep::Tempo { factor } => format!("atempo={factor}"),
        }
    }
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Where start cuts are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimStrategy {
    /// As an `atrim` step in the filter graph.
    #[default]
    Filter,
    /// As a seek on the input.
    InputSeek,
}

/// Options for building filter steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Output durations closer than this need no speed change.
    pub speed_tolerance_secs: f64,
    pub trim_strategy: TrimStrategy,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            speed_tolerance_secs: 0.5,
            trim_strategy: TrimStrategy::Filter,
        }
    }
}

/// Compute the steps aligning `item` to `reference`.
pub fn filter_steps(item: &MergeItem, reference: &MergeItem, opts: &FilterOptions) -> Vec<FilterStep> {
    let mut steps = Vec::new();

    if opts.trim_strategy == TrimStrategy::Filter && item.start_cut_frames() > 0.0 {
        steps.push(FilterStep::Trim {
            start_secs: item.start_cut_frames() / item.frame_rate(),
        });
    }

    let factor = item.effective_speed(reference);
    if item.duration_delta(reference) > opts.speed_tolerance_secs
        && factor.is_finite()
        && (factor - 1.0).abs() > SPEED_EPSILON
    {
        steps.push(FilterStep::Tempo { factor });
    }

    steps
}

/// The compiled filter chain of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterFragment {
    pub index: usize,
    pub steps: Vec<FilterStep>,
}

impl FilterFragment {
    pub fn new(index: usize, steps: Vec<FilterStep>) -> Self {
        Self { index, steps }
    }

    /// Final output label of this item, without brackets.
    pub fn output_label(&self) -> String {
        format!("a{}", self.index)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Labeled filter graph text, or `None` when there are no steps.
    pub fn render(&self) -> Option<String> {
        let last = self.steps.len().checked_sub(1)?;
        let chains: Vec<String> = self
            .steps
            .iter()
            .enumerate()
            .map(|(k, step)| {
                let input = if k == 0 {
                    format!("{}:a", self.index)
                } else {
                    format!("step{}_{}", self.index, k)
                };
                let output = if k == last {
                    self.output_label()
                } else {
                    format!("step{}_{}", self.index, k + 1)
                };
                format!("[{input}]{step}[{output}]")
            })
            .collect();
        Some(chains.join(";"))
    }
}

/// Join all non-empty fragments into one `-filter_complex` expression.
pub fn compile_filter_graph(fragments: &[FilterFragment]) -> String {
    fragments
        .iter()
        .filter_map(FilterFragment::render)
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::Correction;
    use crate::probe::ProbedFacts;
    use std::time::Duration;

    fn item(frames: f64, fps: f64) -> MergeItem {
        MergeItem::new(
            "/src/x.mkv",
            ProbedFacts {
                frame_rate: fps,
                duration: Duration::from_secs_f64(frames / fps),
                has_video: true,
                has_audio: true,
            },
            None,
        )
    }

    #[test]
    fn untouched_item_has_no_steps() {
        let reference = item(10_000.0, 25.0);
        let other = item(10_005.0, 25.0);
        assert!(filter_steps(&other, &reference, &FilterOptions::default()).is_empty());

        let fragment = FilterFragment::new(1, Vec::new());
        assert!(fragment.is_empty());
        assert_eq!(fragment.render(), None);
        assert_eq!(compile_filter_graph(&[fragment]), "");
    }

    #[test]
    fn start_cut_becomes_trim() {
        let reference = item(10_000.0, 25.0);
        let mut other = item(10_720.0, 25.0);
        other.apply(Correction {
            start_cut_frames: 720.0,
            ..Correction::default()
        });

        let steps = filter_steps(&other, &reference, &FilterOptions::default());
        assert_eq!(steps, vec![FilterStep::Trim { start_secs: 28.8 }]);
        assert_eq!(
            FilterFragment::new(1, steps).render().unwrap(),
            "[1:a]atrim=start=28.8,asetpts=PTS-STARTPTS[a1]"
        );
    }

    #[test]
    fn input_seek_strategy_skips_trim_step() {
        let reference = item(10_000.0, 25.0);
        let mut other = item(10_720.0, 25.0);
        other.apply(Correction {
            start_cut_frames: 720.0,
            ..Correction::default()
        });
        let opts = FilterOptions {
            trim_strategy: TrimStrategy::InputSeek,
            ..FilterOptions::default()
        };
        assert!(filter_steps(&other, &reference, &opts).is_empty());
    }

    #[test]
    fn frame_rate_mismatch_gets_tempo() {
        let reference = item(10_000.0, 25.0);
        let other = item(10_000.0, 24.0);
        let steps = filter_steps(&other, &reference, &FilterOptions::default());
        match steps.as_slice() {
            [FilterStep::Tempo { factor }] => assert!((factor - 25.0 / 24.0).abs() < 1e-9),
            other => panic!("unexpected steps {other:?}"),
        }
    }

    #[test]
    fn identity_multiplier_never_adds_tempo() {
        let reference = item(10_000.0, 25.0);
        let mut other = item(10_050.0, 25.0);
        other.apply(Correction {
            start_cut_frames: 500.0,
            end_cut_frames: 0.0,
            speed_multiplier: Some(1.0),
        });
        let steps = filter_steps(&other, &reference, &FilterOptions::default());
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0], FilterStep::Trim { .. }));
    }

    #[test]
    fn chained_steps_use_unique_labels() {
        let fragment = FilterFragment::new(
            2,
            vec![
                FilterStep::Trim { start_secs: 20.0 },
                FilterStep::Tempo { factor: 1.04 },
            ],
        );
        assert_eq!(
            fragment.render().unwrap(),
            "[2:a]atrim=start=20,asetpts=PTS-STARTPTS[step2_1];[step2_1]atempo=1.04[a2]"
        );
    }

    #[test]
    fn graph_joins_fragments() {
        let graph = compile_filter_graph(&[
            FilterFragment::new(0, Vec::new()),
            FilterFragment::new(1, vec![FilterStep::Tempo { factor: 1.5 }]),
            FilterFragment::new(2, vec![FilterStep::Tempo { factor: 0.8 }]),
        ]);
        assert_eq!(graph, "[1:a]atempo=1.5[a1];[2:a]atempo=0.8[a2]");
    }
}
