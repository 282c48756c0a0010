use serde::{Deserialize, Serialize};

mod overview;
mod range;

pub use overview::{
    DashboardOverview, PlatformOverview, RepositoriesOverview, RepositoryListing,
    RepositoryListingSummary, TeamsOverview,
};
pub use range::DateRange;

pub const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::GitHub, Self::GitLab, Self::Bitbucket];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Bitbucket => "Bitbucket",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket" => Ok(Self::Bitbucket),
            other => Err(format!(
                "invalid platform '{other}', expected one of: github, gitlab, bitbucket"
            )),
        }
    }
}

/// Canonical grouping/selection key for a raw platform value.
///
/// Keys are trimmed and lowercased; absent or blank input maps to
/// [`UNKNOWN_PLATFORM`]. Unrecognized but non-blank names are kept as-is so a
/// new platform in the data service still groups on its own.
pub fn platform_key(raw: Option<&str>) -> String {
    raw.map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_owned())
}

/// One metric row for a platform, team, or repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub name: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub failed_jobs: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, platform: &str) -> Self {
        Self {
            name: name.into(),
            platform: platform_key(Some(platform)),
            ..Self::default()
        }
    }

    /// Sets job counts, clamping `failed` so it never exceeds `total`.
    pub fn with_jobs(mut self, total: u64, failed: u64) -> Self {
        self.total_jobs = total;
        self.failed_jobs = failed.min(total);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.total_cost = sanitize_cost(cost);
        self
    }

    pub fn successful_jobs(&self) -> u64 {
        self.total_jobs.saturating_sub(self.failed_jobs)
    }

    pub fn platform_key(&self) -> String {
        platform_key(Some(&self.platform))
    }
}

/// Additive totals over a set of entity records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_cost: f64,
    pub total_runs: u64,
    pub failed_jobs: u64,
    pub successful_jobs: u64,
}

impl AggregateSummary {
    /// Builds a summary from run counts, deriving `successful_jobs`.
    pub fn from_counts(total_cost: f64, total_runs: u64, failed_jobs: u64) -> Self {
        let failed_jobs = failed_jobs.min(total_runs);
        Self {
            total_cost: sanitize_cost(total_cost),
            total_runs,
            failed_jobs,
            successful_jobs: total_runs - failed_jobs,
        }
    }

    pub fn add_record(&mut self, record: &EntityRecord) {
        self.total_cost += record.total_cost;
        self.total_runs = self.total_runs.saturating_add(record.total_jobs);
        self.failed_jobs = self.failed_jobs.saturating_add(record.failed_jobs);
        self.successful_jobs = self
            .successful_jobs
            .saturating_add(record.successful_jobs());
    }

    pub fn is_zero(&self) -> bool {
        self.total_cost == 0.0 && self.total_runs == 0
    }
}

/// Costs are non-negative and finite; anything else collapses to zero.
pub fn sanitize_cost(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn format_cost(value: f64) -> String {
    format!("{value:.2}")
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
