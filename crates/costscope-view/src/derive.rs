use std::collections::BTreeSet;

use costscope_analysis::{
    ChartDimensions, ChartSpec, GroupedRecords, Highlights, filter_records, group_by_platform,
    highlights, select_chart, sort_records, summaries_agree, summarize_all,
};
use costscope_config::CostscopeConfig;
use costscope_core::{AggregateSummary, EntityRecord};
use serde::Serialize;

use crate::page::{PageData, PageKind};
use crate::selection::SelectionState;

/// Page-wide inputs that do not change with the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub universe: BTreeSet<String>,
    pub dimensions: ChartDimensions,
}

impl ViewContext {
    pub fn for_page(page: PageKind, config: &CostscopeConfig) -> Self {
        Self {
            universe: page.universe(&config.view.platforms),
            dimensions: ChartDimensions {
                width: config.chart.width,
                height: config.chart.height,
            },
        }
    }
}

/// Everything a table or chart renderer needs for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub summary: AggregateSummary,
    pub rows: Vec<EntityRecord>,
    pub groups: Option<GroupedRecords>,
    pub chart: Option<ChartSpec>,
    pub highlights: Highlights,
}

/// Recomputes the view from loaded data. Pure apart from a drift warning.
///
/// The summary and chart cover the selected platforms; the search text only
/// narrows the rows, groups and highlights.
pub fn derive_view(
    data: &PageData,
    selection: &SelectionState,
    context: &ViewContext,
) -> DerivedView {
    let selected = filter_records(&data.records, &selection.selected_keys, "");
    let local = summarize_all(&selected);

    let summary = match data.population_summary {
        Some(population) if selection.selected_keys == context.universe => {
            if !data.records.is_empty() && !summaries_agree(&population, &local) {
                tracing::warn!(
                    server_cost = population.total_cost,
                    local_cost = local.total_cost,
                    server_runs = population.total_runs,
                    local_runs = local.total_runs,
                    "server summary disagrees with local fold"
                );
            }
            population
        }
        _ => local,
    };

    let visible = filter_records(&selected, &selection.selected_keys, &selection.search);
    let rows = sort_records(&visible, selection.sort);
    let groups = selection.grouped.then(|| group_by_platform(&rows));
    let chart = select_chart(&selected, &selection.selected_keys, context.dimensions);
    let highlights = highlights(&rows);

    DerivedView {
        summary,
        rows,
        groups,
        chart,
        highlights,
    }
}
