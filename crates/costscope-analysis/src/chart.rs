//! Declarative chart descriptors.
//!
//! [`select_chart`] chooses between a job breakdown bar chart (one selected
//! key) and a cost share arc chart (several keys). The descriptor is plain
//! data that serializes to a Vega-Lite v5 document; drawing it is left to a
//! [`ChartRenderer`].

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use costscope_core::{AggregateSummary, EntityRecord, capitalize, format_percent};
use serde::Serialize;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
pub const SUCCESSFUL_JOBS_LABEL: &str = "Successful Jobs";
pub const FAILED_JOBS_LABEL: &str = "Failed Jobs";
pub const JOB_BREAKDOWN_DESCRIPTION: &str = "Job Breakdown";
pub const COST_SHARE_DESCRIPTION: &str = "Platform Cost Breakdown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartDimensions {
    fn default() -> Self {
        Self {
            width: 500,
            height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub description: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub data: ChartData,
    pub mark: ChartMark,
    pub encoding: ChartEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ChartView>,
}

impl ChartSpec {
    pub fn job_counts(&self) -> Vec<&JobCountDatum> {
        self.data
            .values
            .iter()
            .filter_map(|datum| match datum {
                ChartDatum::JobCount(entry) => Some(entry),
                ChartDatum::CostShare(_) => None,
            })
            .collect()
    }

    pub fn cost_shares(&self) -> Vec<&CostShareDatum> {
        self.data
            .values
            .iter()
            .filter_map(|datum| match datum {
                ChartDatum::CostShare(entry) => Some(entry),
                ChartDatum::JobCount(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMark {
    Bar,
    Arc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub values: Vec<ChartDatum>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartDatum {
    JobCount(JobCountDatum),
    CostShare(CostShareDatum),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCountDatum {
    #[serde(rename = "type")]
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostShareDatum {
    pub name: String,
    pub cost: f64,
    pub percent: f64,
    pub percent_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ChartEncoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldEncoding>,
    pub tooltip: Vec<TooltipField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEncoding {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

impl FieldEncoding {
    fn new(field: &str, kind: FieldType) -> Self {
        Self {
            field: field.to_owned(),
            kind,
            axis: None,
        }
    }

    fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Quantitative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_angle: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipField {
    pub field: String,
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl TooltipField {
    fn new(field: &str, title: &str) -> Self {
        Self {
            field: field.to_owned(),
            title: title.to_owned(),
            kind: None,
            format: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ChartView {
    pub stroke: Option<String>,
}

/// Rendering boundary: turns a descriptor into something visible in `container`.
pub trait ChartRenderer {
    type Error;

    fn render(&mut self, spec: &ChartSpec, container: &str) -> Result<(), Self::Error>;
}

/// Writes each descriptor to `<dir>/<container>.vl.json` for an external Vega-Lite viewer.
#[derive(Debug, Clone)]
pub struct VegaLiteFileRenderer {
    dir: PathBuf,
}

impl VegaLiteFileRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, container: &str) -> PathBuf {
        let stem = container
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.dir.join(format!("{stem}.vl.json"))
    }
}

impl ChartRenderer for VegaLiteFileRenderer {
    type Error = io::Error;

    fn render(&mut self, spec: &ChartSpec, container: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(container);
        let mut file = fs::File::create(&path)?;
        write_vega_lite(spec, &mut file)?;
        tracing::debug!(path = %path.display(), mark = ?spec.mark, "wrote chart descriptor");
        Ok(())
    }
}

pub fn write_vega_lite(spec: &ChartSpec, out: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, spec)?;
    writeln!(out)
}

/// Picks the chart shape for the records restricted to `selected_keys`.
///
/// Records are folded per platform key first, so a listing with many rows per
/// platform charts one slice per selected platform. Returns `None` when
/// nothing is selected, nothing matched, or the matched totals are all zero.
pub fn select_chart(
    records: &[EntityRecord],
    selected_keys: &BTreeSet<String>,
    dimensions: ChartDimensions,
) -> Option<ChartSpec> {
    if selected_keys.is_empty() {
        return None;
    }

    let totals = totals_by_key(records, selected_keys);
    if totals.is_empty() {
        return None;
    }

    if selected_keys.len() == 1 {
        let (key, summary) = &totals[0];
        job_breakdown(key, summary, dimensions)
    } else {
        cost_share(&totals, dimensions)
    }
}

fn totals_by_key(
    records: &[EntityRecord],
    selected_keys: &BTreeSet<String>,
) -> Vec<(String, AggregateSummary)> {
    selected_keys
        .iter()
        .filter_map(|key| {
            let mut matched = false;
            let mut summary = AggregateSummary::default();
            for record in records.iter().filter(|record| &record.platform_key() == key) {
                matched = true;
                summary.add_record(record);
            }
            matched.then(|| (key.clone(), summary))
        })
        .collect()
}

fn job_breakdown(
    key: &str,
    summary: &AggregateSummary,
    dimensions: ChartDimensions,
) -> Option<ChartSpec> {
    if summary.total_runs == 0 {
        return None;
    }

    Some(ChartSpec {
        schema: VEGA_LITE_SCHEMA.to_owned(),
        description: JOB_BREAKDOWN_DESCRIPTION.to_owned(),
        title: format!("Job Breakdown for {}", key.to_uppercase()),
        width: dimensions.width,
        height: dimensions.height,
        data: ChartData {
            values: vec![
                ChartDatum::JobCount(JobCountDatum {
                    category: SUCCESSFUL_JOBS_LABEL.to_owned(),
                    count: summary.successful_jobs,
                }),
                ChartDatum::JobCount(JobCountDatum {
                    category: FAILED_JOBS_LABEL.to_owned(),
                    count: summary.failed_jobs,
                }),
            ],
        },
        mark: ChartMark::Bar,
        encoding: ChartEncoding {
            x: Some(FieldEncoding::new("type", FieldType::Nominal).with_axis(Axis {
                title: "Job Type".to_owned(),
                label_angle: Some(0),
            })),
            y: Some(
                FieldEncoding::new("count", FieldType::Quantitative).with_axis(Axis {
                    title: "Count".to_owned(),
                    label_angle: None,
                }),
            ),
            theta: None,
            color: Some(FieldEncoding::new("type", FieldType::Nominal)),
            tooltip: vec![
                TooltipField::new("type", "Job Type"),
                TooltipField::new("count", "Count"),
            ],
        },
        view: None,
    })
}

fn cost_share(
    totals: &[(String, AggregateSummary)],
    dimensions: ChartDimensions,
) -> Option<ChartSpec> {
    let total_cost = totals
        .iter()
        .map(|(_, summary)| summary.total_cost)
        .sum::<f64>();
    if total_cost <= 0.0 {
        return None;
    }

    let values = totals
        .iter()
        .map(|(key, summary)| {
            let percent = summary.total_cost / total_cost * 100.0;
            ChartDatum::CostShare(CostShareDatum {
                name: capitalize(key),
                cost: summary.total_cost,
                percent,
                percent_label: format_percent(percent),
            })
        })
        .collect();

    Some(ChartSpec {
        schema: VEGA_LITE_SCHEMA.to_owned(),
        description: COST_SHARE_DESCRIPTION.to_owned(),
        title: "Cost Breakdown by Platform".to_owned(),
        width: dimensions.width,
        height: dimensions.height,
        data: ChartData { values },
        mark: ChartMark::Arc,
        encoding: ChartEncoding {
            x: None,
            y: None,
            theta: Some(FieldEncoding::new("cost", FieldType::Quantitative)),
            color: Some(FieldEncoding::new("name", FieldType::Nominal)),
            tooltip: vec![
                TooltipField::new("name", "Platform"),
                TooltipField {
                    kind: Some(FieldType::Quantitative),
                    format: Some(".2f".to_owned()),
                    ..TooltipField::new("cost", "Total Cost ($)")
                },
                TooltipField::new("percentLabel", "Share"),
            ],
        },
        view: Some(ChartView::default()),
    })
}
