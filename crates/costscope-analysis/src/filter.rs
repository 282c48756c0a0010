use std::collections::BTreeSet;

use costscope_core::EntityRecord;

pub fn matches_selection(record: &EntityRecord, selected_keys: &BTreeSet<String>) -> bool {
    selected_keys.contains(&record.platform_key())
}

/// Case-insensitive substring match on the record name. A blank query matches everything.
pub fn matches_search(record: &EntityRecord, query: &str) -> bool {
    let query = query.trim();
    query.is_empty()
        || record
            .name
            .to_lowercase()
            .contains(&query.to_lowercase())
}

pub fn filter_records(
    records: &[EntityRecord],
    selected_keys: &BTreeSet<String>,
    query: &str,
) -> Vec<EntityRecord> {
    records
        .iter()
        .filter(|record| matches_selection(record, selected_keys) && matches_search(record, query))
        .cloned()
        .collect()
}
