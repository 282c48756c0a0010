use costscope_core::EntityRecord;
use serde::Serialize;

/// Headline entities for the summary cards of a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub most_expensive: Option<String>,
    pub most_jobs: Option<String>,
    pub most_failed_jobs: Option<String>,
    pub cheapest: Option<String>,
    pub deepest: Option<String>,
}

/// Ties go to the record that appears first.
pub fn highlights(records: &[EntityRecord]) -> Highlights {
    Highlights {
        most_expensive: first_extreme(records, |r| Some(r.total_cost), |a, b| a > b),
        most_jobs: first_extreme(records, |r| Some(r.total_jobs as f64), |a, b| a > b),
        most_failed_jobs: first_extreme(records, |r| Some(r.failed_jobs as f64), |a, b| a > b),
        cheapest: first_extreme(records, |r| Some(r.total_cost), |a, b| a < b),
        deepest: first_extreme(records, |r| r.depth.map(f64::from), |a, b| a > b),
    }
}

fn first_extreme<K, B>(records: &[EntityRecord], key: K, better: B) -> Option<String>
where
    K: Fn(&EntityRecord) -> Option<f64>,
    B: Fn(f64, f64) -> bool,
{
    let mut best: Option<(f64, &EntityRecord)> = None;
    for record in records {
        let Some(value) = key(record) else {
            continue;
        };
        match best {
            Some((current, _)) if !better(value, current) => {}
            _ => best = Some((value, record)),
        }
    }

    best.map(|(_, record)| record.name.clone())
}
