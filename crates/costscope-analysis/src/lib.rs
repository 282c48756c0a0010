mod chart;
mod filter;
mod group;
mod highlights;
mod reducer;
mod sort;

pub use chart::{
    Axis, COST_SHARE_DESCRIPTION, ChartData, ChartDatum, ChartDimensions, ChartEncoding, ChartMark,
    ChartRenderer, ChartSpec, ChartView, CostShareDatum, FAILED_JOBS_LABEL, FieldEncoding,
    FieldType, JOB_BREAKDOWN_DESCRIPTION, JobCountDatum, SUCCESSFUL_JOBS_LABEL, TooltipField,
    VEGA_LITE_SCHEMA, VegaLiteFileRenderer, select_chart, write_vega_lite,
};
pub use filter::{filter_records, matches_search, matches_selection};
pub use group::{GroupedRecords, RecordGroup, group_by_platform};
pub use highlights::{Highlights, highlights};
pub use reducer::{SUMMARY_RELATIVE_TOLERANCE, summaries_agree, summarize, summarize_all};
pub use sort::{ColumnKind, SortColumn, SortOrder, SortState, sort_records};
