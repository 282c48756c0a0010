use std::collections::HashMap;

use costscope_core::EntityRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordGroup {
    pub platform: String,
    pub records: Vec<EntityRecord>,
}

/// Records partitioned by platform key, in first-seen group order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct GroupedRecords {
    groups: Vec<RecordGroup>,
}

impl GroupedRecords {
    pub fn get(&self, platform: &str) -> Option<&[EntityRecord]> {
        self.groups
            .iter()
            .find(|group| group.platform == platform)
            .map(|group| group.records.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.platform.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<RecordGroup> {
        self.groups
    }
}

/// Partitions an already ordered sequence by platform.
///
/// Relative order inside each group is the input order; records without a
/// platform land in the `unknown` group. Never produces an empty group.
pub fn group_by_platform(records: &[EntityRecord]) -> GroupedRecords {
    let mut groups: Vec<RecordGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = record.platform_key();
        let index = match positions.get(&key) {
            Some(index) => *index,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(RecordGroup {
                    platform: key,
                    records: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[index].records.push(record.clone());
    }

    GroupedRecords { groups }
}

#[cfg(test)]
mod tests {
    use costscope_core::UNKNOWN_PLATFORM;

    use super::*;

    #[test]
    fn groups_preserve_input_order_and_first_seen_keys() {
        let records = vec![
            EntityRecord::new("a", "gitlab"),
            EntityRecord::new("b", "github"),
            EntityRecord::new("c", "gitlab"),
            EntityRecord::new("d", "github"),
        ];

        let grouped = group_by_platform(&records);

        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["gitlab", "github"]);
        let gitlab = grouped.get("gitlab").expect("gitlab group");
        assert_eq!(
            gitlab.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert!(grouped.get("bitbucket").is_none());
    }

    #[test]
    fn blank_platform_falls_back_to_unknown() {
        let records = vec![
            EntityRecord {
                platform: String::new(),
                ..EntityRecord::new("orphan", "github")
            },
            EntityRecord::new("tracked", "github"),
        ];

        let grouped = group_by_platform(&records);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get(UNKNOWN_PLATFORM).map(<[_]>::len), Some(1));
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_by_platform(&[]).is_empty());
    }
}
