use serde::{Deserialize, Serialize};

/// Reporting window for every data-service query.
///
/// The dashboard and the data service disagree on two spellings (`6m`/`6mo`,
/// `1y`/`1yr`). Both parse; [`DateRange::query_value`] always yields the
/// spelling the data service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "6m", alias = "6mo")]
    Last6Months,
    #[serde(rename = "1y", alias = "1yr")]
    LastYear,
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    pub const ALL: [DateRange; 5] = [
        Self::Last7Days,
        Self::Last30Days,
        Self::Last6Months,
        Self::LastYear,
        Self::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last6Months => "6m",
            Self::LastYear => "1y",
            Self::All => "all",
        }
    }

    pub fn query_value(self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last6Months => "6mo",
            Self::LastYear => "1yr",
            Self::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
            Self::Last6Months => "Last 6 Months",
            Self::LastYear => "Last Year",
            Self::All => "All Time",
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "6m" | "6mo" => Ok(Self::Last6Months),
            "1y" | "1yr" => Ok(Self::LastYear),
            "all" => Ok(Self::All),
            other => Err(format!(
                "invalid date range '{other}', expected one of: 7d, 30d, 6m, 1y, all"
            )),
        }
    }
}
