use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use costscope_analysis::{ChartRenderer, SortColumn, VegaLiteFileRenderer};
use costscope_config::CostscopeConfig;
use costscope_core::{DateRange, EntityRecord, Platform, format_cost};
use costscope_source::DataSource;
use costscope_view::{PageKind, ViewCoordinator};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid output format '{other}', expected one of: table, json"
            )),
        }
    }
}

/// Page names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageName {
    Dashboard,
    Platform,
    PlatformTeams,
    PlatformRepositories,
    Teams,
    Repositories,
}

impl PageName {
    pub fn into_page(self, platform: Option<Platform>) -> Result<PageKind, String> {
        let require = |name: &str| {
            platform.ok_or_else(|| format!("page '{name}' needs --platform"))
        };
        match self {
            Self::Dashboard => Ok(PageKind::Dashboard),
            Self::Platform => Ok(PageKind::PlatformSummary(require("platform")?)),
            Self::PlatformTeams => Ok(PageKind::PlatformTeams(require("platform-teams")?)),
            Self::PlatformRepositories => Ok(PageKind::PlatformRepositories(require(
                "platform-repositories",
            )?)),
            Self::Teams => Ok(PageKind::Teams),
            Self::Repositories => Ok(PageKind::Repositories),
        }
    }
}

impl FromStr for PageName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "platform" => Ok(Self::Platform),
            "platform-teams" => Ok(Self::PlatformTeams),
            "platform-repositories" => Ok(Self::PlatformRepositories),
            "teams" => Ok(Self::Teams),
            "repositories" => Ok(Self::Repositories),
            other => Err(format!(
                "invalid page '{other}', expected one of: dashboard, platform, platform-teams, \
                 platform-repositories, teams, repositories"
            )),
        }
    }
}

/// Selection actions applied, in order, before the page loads.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub range: Option<DateRange>,
    pub select: Option<Vec<String>>,
    pub sort: Vec<SortColumn>,
    pub group: bool,
    pub search: Option<String>,
}

pub async fn run_page_once(
    source: &dyn DataSource,
    config: &CostscopeConfig,
    page: PageKind,
    request: &PageRequest,
) -> ViewCoordinator {
    let mut view = ViewCoordinator::from_config(page, config);

    if let Some(range) = request.range {
        view.set_date_range(range);
    }
    if let Some(keys) = &request.select {
        view.set_selected_platforms(keys);
    }
    for column in &request.sort {
        view.sort_by(*column);
    }
    view.set_grouped(request.group);
    if let Some(search) = request.search.as_deref() {
        view.set_search(search);
    }

    view.refresh(source).await;
    view
}

pub fn write_report(
    view: &ViewCoordinator,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(view, out).context("failed to write table"),
        OutputFormat::Json => write_json(view, out).context("failed to write JSON report"),
    }
}

const TABLE_HEADER: &str =
    "name\tplatform\tteam\tparent_team\tdepth\ttotal_jobs\tfailed_jobs\ttotal_cost";

pub fn write_table(view: &ViewCoordinator, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{TABLE_HEADER}")?;

    match view.current_groups() {
        Some(groups) => {
            for group in groups.iter() {
                writeln!(out, "# {}", group.platform)?;
                for record in &group.records {
                    write_row(record, out)?;
                }
            }
        }
        None => {
            for record in view.current_ordered_rows() {
                write_row(record, out)?;
            }
        }
    }

    match view.current_summary() {
        Some(summary) => writeln!(
            out,
            "summary\ttotal_cost={}\ttotal_runs={}\tsuccessful_jobs={}\tfailed_jobs={}",
            format_cost(summary.total_cost),
            summary.total_runs,
            summary.successful_jobs,
            summary.failed_jobs
        )?,
        None => writeln!(out, "summary\tunavailable")?,
    }

    let highlights = view.current_highlights();
    for (label, value) in [
        ("most_expensive", &highlights.most_expensive),
        ("most_jobs", &highlights.most_jobs),
        ("most_failed_jobs", &highlights.most_failed_jobs),
        ("cheapest", &highlights.cheapest),
        ("deepest", &highlights.deepest),
    ] {
        if let Some(name) = value {
            writeln!(out, "highlight\t{label}={}", normalize_field(name))?;
        }
    }

    Ok(())
}

fn write_row(record: &EntityRecord, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        normalize_field(&record.name),
        normalize_field(&record.platform),
        normalize_field(record.team.as_deref().unwrap_or_default()),
        normalize_field(record.parent_team.as_deref().unwrap_or_default()),
        record
            .depth
            .map(|depth| depth.to_string())
            .unwrap_or_default(),
        record.total_jobs,
        record.failed_jobs,
        format_cost(record.total_cost)
    )
}

fn normalize_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

pub fn write_json(view: &ViewCoordinator, out: &mut dyn Write) -> Result<()> {
    let data = view.data();
    let report = json!({
        "page": view.page().slug(),
        "selection": view.selection(),
        "view": view.current_view(),
        "overview": data.and_then(|data| data.overview.as_ref()),
        "listingSummary": data.and_then(|data| data.listing_summary.as_ref()),
        "lastError": view.last_error(),
    });
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the page chart, if it has one, and returns the file written.
pub fn write_chart(view: &ViewCoordinator, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(spec) = view.current_chart_spec() else {
        return Ok(None);
    };

    let mut renderer = VegaLiteFileRenderer::new(dir);
    let container = view.page().slug();
    renderer
        .render(spec, &container)
        .with_context(|| format!("failed to write chart for {container}"))?;
    Ok(Some(renderer.path_for(&container)))
}
