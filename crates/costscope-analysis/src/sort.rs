use std::borrow::Cow;
use std::cmp::Ordering;

use costscope_core::EntityRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Name,
    Platform,
    Team,
    ParentTeam,
    TotalJobs,
    FailedJobs,
    TotalCost,
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

impl SortColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Platform => "platform",
            Self::Team => "team",
            Self::ParentTeam => "parentTeam",
            Self::TotalJobs => "totalJobs",
            Self::FailedJobs => "failedJobs",
            Self::TotalCost => "totalCost",
            Self::Depth => "depth",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Self::Name | Self::Platform | Self::Team | Self::ParentTeam => ColumnKind::Categorical,
            Self::TotalJobs | Self::FailedJobs | Self::TotalCost | Self::Depth => {
                ColumnKind::Numeric
            }
        }
    }

    /// Text columns read naturally A to Z; metric columns lead with the largest.
    pub fn default_order(self) -> SortOrder {
        match self.kind() {
            ColumnKind::Categorical => SortOrder::Asc,
            ColumnKind::Numeric => SortOrder::Desc,
        }
    }

    fn numeric_value(self, record: &EntityRecord) -> f64 {
        match self {
            Self::TotalJobs => record.total_jobs as f64,
            Self::FailedJobs => record.failed_jobs as f64,
            Self::TotalCost => record.total_cost,
            Self::Depth => record.depth.map(f64::from).unwrap_or(0.0),
            Self::Name | Self::Platform | Self::Team | Self::ParentTeam => 0.0,
        }
    }

    /// Platform compares by canonical key, the same key rows group under.
    fn text_value(self, record: &EntityRecord) -> Cow<'_, str> {
        match self {
            Self::Name => Cow::Borrowed(&record.name),
            Self::Platform => Cow::Owned(record.platform_key()),
            Self::Team => Cow::Borrowed(record.team.as_deref().unwrap_or("")),
            Self::ParentTeam => Cow::Borrowed(record.parent_team.as_deref().unwrap_or("")),
            Self::TotalJobs | Self::FailedJobs | Self::TotalCost | Self::Depth => {
                Cow::Borrowed("")
            }
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "name" => Ok(Self::Name),
            "platform" => Ok(Self::Platform),
            "team" => Ok(Self::Team),
            "parentTeam" | "parent_team" => Ok(Self::ParentTeam),
            "totalJobs" | "total_jobs" | "jobs" => Ok(Self::TotalJobs),
            "failedJobs" | "failed_jobs" => Ok(Self::FailedJobs),
            "totalCost" | "total_cost" | "cost" => Ok(Self::TotalCost),
            "depth" => Ok(Self::Depth),
            other => Err(format!(
                "invalid sort column '{other}', expected one of: name, platform, team, \
                 parentTeam, totalJobs, failedJobs, totalCost, depth"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub sort_key: SortColumn,
    pub sort_order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            sort_key: SortColumn::TotalCost,
            sort_order: SortOrder::Desc,
        }
    }
}

impl SortState {
    pub fn new(sort_key: SortColumn, sort_order: SortOrder) -> Self {
        Self {
            sort_key,
            sort_order,
        }
    }

    /// Clicking the active column flips direction; any other column starts
    /// from its own default direction.
    pub fn sort_by(self, column: SortColumn) -> Self {
        if column == self.sort_key {
            Self::new(column, self.sort_order.flipped())
        } else {
            Self::new(column, column.default_order())
        }
    }

    fn compare(&self, left: &EntityRecord, right: &EntityRecord) -> Ordering {
        let ordering = match self.sort_key.kind() {
            ColumnKind::Numeric => self
                .sort_key
                .numeric_value(left)
                .total_cmp(&self.sort_key.numeric_value(right)),
            ColumnKind::Categorical => self
                .sort_key
                .text_value(left)
                .cmp(&self.sort_key.text_value(right)),
        };

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Returns the records ordered by `state`.
///
/// Records with equal keys keep their input order in both directions.
pub fn sort_records(records: &[EntityRecord], state: SortState) -> Vec<EntityRecord> {
    let mut indexed = records.iter().enumerate().collect::<Vec<_>>();
    indexed.sort_by(|(left_index, left), (right_index, right)| {
        state
            .compare(left, right)
            .then_with(|| left_index.cmp(right_index))
    });

    indexed
        .into_iter()
        .map(|(_, record)| record.clone())
        .collect()
}
