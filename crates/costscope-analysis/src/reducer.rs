use costscope_core::{AggregateSummary, EntityRecord};

/// Relative tolerance used when comparing a local fold with a server total.
pub const SUMMARY_RELATIVE_TOLERANCE: f64 = 1e-6;

/// Folds every record accepted by `predicate` into one summary.
///
/// An empty selection yields the all-zero summary.
pub fn summarize<'a, I, P>(records: I, mut predicate: P) -> AggregateSummary
where
    I: IntoIterator<Item = &'a EntityRecord>,
    P: FnMut(&EntityRecord) -> bool,
{
    records
        .into_iter()
        .filter(|record| predicate(*record))
        .fold(AggregateSummary::default(), |mut acc, record| {
            acc.add_record(record);
            acc
        })
}

pub fn summarize_all(records: &[EntityRecord]) -> AggregateSummary {
    summarize(records, |_| true)
}

/// Whether two summaries describe the same population.
///
/// Every field is compared with [`SUMMARY_RELATIVE_TOLERANCE`]; magnitudes
/// below 1.0 are compared absolutely so rounding noise around zero passes.
pub fn summaries_agree(left: &AggregateSummary, right: &AggregateSummary) -> bool {
    approx_eq(left.total_cost, right.total_cost)
        && approx_eq(left.total_runs as f64, right.total_runs as f64)
        && approx_eq(left.failed_jobs as f64, right.failed_jobs as f64)
        && approx_eq(left.successful_jobs as f64, right.successful_jobs as f64)
}

fn approx_eq(left: f64, right: f64) -> bool {
    let scale = left.abs().max(right.abs()).max(1.0);
    (left - right).abs() <= SUMMARY_RELATIVE_TOLERANCE * scale
}
