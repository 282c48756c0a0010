//! Server-computed page summaries, already normalized.

use serde::{Deserialize, Serialize};

use crate::{AggregateSummary, EntityRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub summary: AggregateSummary,
    pub failed_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverview {
    pub platform: String,
    pub total_cost: f64,
    pub total_jobs: u64,
    pub failed_jobs: u64,
    pub most_costly_repo: Option<String>,
    pub most_costly_repo_cost: f64,
}

impl PlatformOverview {
    pub fn summary(&self) -> AggregateSummary {
        AggregateSummary::from_counts(self.total_cost, self.total_jobs, self.failed_jobs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamsOverview {
    pub platform: String,
    pub most_costly_team: Option<String>,
    pub most_costly_team_cost: f64,
    pub team_with_most_jobs: Option<String>,
    pub team_with_most_jobs_count: u64,
    pub team_with_most_failed_jobs: Option<String>,
    pub team_with_most_failed_jobs_count: u64,
    pub total_active_teams: u64,
    pub total_cost: f64,
    pub total_jobs_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoriesOverview {
    pub platform: String,
    pub most_costly_repo: Option<String>,
    pub most_costly_repo_cost: f64,
    pub repo_with_most_jobs: Option<String>,
    pub repo_with_most_jobs_count: u64,
    pub total_active_repositories: u64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryListingSummary {
    pub most_expensive_repo: Option<String>,
    pub most_jobs_repo: Option<String>,
    pub cheapest_repo: Option<String>,
}

/// The global repository listing arrives together with its own highlights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryListing {
    pub repositories: Vec<EntityRecord>,
    pub summary: RepositoryListingSummary,
}
