//! Payload shapes of the data service and their normalization.
//!
//! The service speaks snake_case and leaves numbers out (or `null`) when a
//! query matched nothing. Every absent number becomes zero here, once, so the
//! analysis code never sees a missing value.

use costscope_core::{
    AggregateSummary, DashboardOverview, EntityRecord, PlatformOverview, RepositoriesOverview,
    RepositoryListing, RepositoryListingSummary, TeamsOverview, platform_key, sanitize_cost,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardSummaryWire {
    total_enterprise_ci_cd_cost: Option<f64>,
    total_failed_build_cost_enterprise: Option<f64>,
    total_runs_enterprise: Option<i64>,
    successful_runs_enterprise: Option<i64>,
    failed_runs_enterprise: Option<i64>,
}

impl DashboardSummaryWire {
    pub(crate) fn normalize(self) -> DashboardOverview {
        let total_runs = count(self.total_runs_enterprise);
        let failed_jobs = count(self.failed_runs_enterprise).min(total_runs);
        let derived_successes = total_runs - failed_jobs;
        let successful_jobs = self
            .successful_runs_enterprise
            .map(|value| count(Some(value)).min(derived_successes))
            .unwrap_or(derived_successes);

        DashboardOverview {
            summary: AggregateSummary {
                total_cost: cost(self.total_enterprise_ci_cd_cost),
                total_runs,
                failed_jobs,
                successful_jobs,
            },
            failed_cost: cost(self.total_failed_build_cost_enterprise),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformCostWire {
    platform: Option<String>,
    total_cost_by_platform: Option<f64>,
    total_jobs: Option<i64>,
    failed_jobs: Option<i64>,
}

impl PlatformCostWire {
    pub(crate) fn normalize(self) -> EntityRecord {
        let key = platform_key(self.platform.as_deref());
        EntityRecord::new(key.clone(), &key)
            .with_jobs(count(self.total_jobs), count(self.failed_jobs))
            .with_cost(cost(self.total_cost_by_platform))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformSummaryWire {
    platform: Option<String>,
    total_cost: Option<f64>,
    total_jobs: Option<i64>,
    failed_jobs: Option<i64>,
    most_costly_repo: Option<String>,
    most_costly_repo_cost: Option<f64>,
}

impl PlatformSummaryWire {
    pub(crate) fn normalize(self, requested: &str) -> PlatformOverview {
        let total_jobs = count(self.total_jobs);
        PlatformOverview {
            platform: platform_key(self.platform.as_deref().or(Some(requested))),
            total_cost: cost(self.total_cost),
            total_jobs,
            failed_jobs: count(self.failed_jobs).min(total_jobs),
            most_costly_repo: self.most_costly_repo,
            most_costly_repo_cost: cost(self.most_costly_repo_cost),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamWire {
    team_name: String,
    parent_team_name: Option<String>,
    platform: Option<String>,
    total_jobs: Option<i64>,
    failed_jobs: Option<i64>,
    total_cost: Option<f64>,
    depth: Option<i64>,
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

impl TeamWire {
    /// `fallback_platform` fills in rows from per-platform listings, which omit it.
    pub(crate) fn normalize(self, fallback_platform: Option<&str>) -> EntityRecord {
        let platform = platform_key(self.platform.as_deref().or(fallback_platform));
        EntityRecord {
            parent_team: self.parent_team_name.filter(|name| !name.trim().is_empty()),
            depth: self
                .depth
                .map(|depth| u32::try_from(depth.max(0)).unwrap_or(u32::MAX)),
            repositories: Some(
                self.repositories
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|name| !name.trim().is_empty())
                    .collect(),
            ),
            ..EntityRecord::new(self.team_name, &platform)
                .with_jobs(count(self.total_jobs), count(self.failed_jobs))
                .with_cost(cost(self.total_cost))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryWire {
    repo_name: String,
    team_name: Option<String>,
    platform: Option<String>,
    total_jobs: Option<i64>,
    failed_jobs: Option<i64>,
    total_cost: Option<f64>,
}

impl RepositoryWire {
    pub(crate) fn normalize(self, fallback_platform: Option<&str>) -> EntityRecord {
        let platform = platform_key(self.platform.as_deref().or(fallback_platform));
        EntityRecord {
            team: self.team_name.filter(|name| !name.trim().is_empty()),
            ..EntityRecord::new(self.repo_name, &platform)
                .with_jobs(count(self.total_jobs), count(self.failed_jobs))
                .with_cost(cost(self.total_cost))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsSummaryWire {
    platform: Option<String>,
    most_costly_team: Option<String>,
    most_costly_team_cost: Option<f64>,
    team_with_most_jobs: Option<String>,
    team_with_most_jobs_count: Option<i64>,
    team_with_most_failed_jobs: Option<String>,
    team_with_most_failed_jobs_count: Option<i64>,
    total_active_teams: Option<i64>,
    total_cost: Option<f64>,
    total_jobs_count: Option<i64>,
}

impl TeamsSummaryWire {
    pub(crate) fn normalize(self, requested: &str) -> TeamsOverview {
        TeamsOverview {
            platform: platform_key(self.platform.as_deref().or(Some(requested))),
            most_costly_team: self.most_costly_team,
            most_costly_team_cost: cost(self.most_costly_team_cost),
            team_with_most_jobs: self.team_with_most_jobs,
            team_with_most_jobs_count: count(self.team_with_most_jobs_count),
            team_with_most_failed_jobs: self.team_with_most_failed_jobs,
            team_with_most_failed_jobs_count: count(self.team_with_most_failed_jobs_count),
            total_active_teams: count(self.total_active_teams),
            total_cost: cost(self.total_cost),
            total_jobs_count: count(self.total_jobs_count),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoriesSummaryWire {
    platform: Option<String>,
    most_costly_repo: Option<String>,
    most_costly_repo_cost: Option<f64>,
    repo_with_most_jobs: Option<String>,
    repo_with_most_jobs_count: Option<i64>,
    total_active_repositories: Option<i64>,
    total_cost: Option<f64>,
}

impl RepositoriesSummaryWire {
    pub(crate) fn normalize(self, requested: &str) -> RepositoriesOverview {
        RepositoriesOverview {
            platform: platform_key(self.platform.as_deref().or(Some(requested))),
            most_costly_repo: self.most_costly_repo,
            most_costly_repo_cost: cost(self.most_costly_repo_cost),
            repo_with_most_jobs: self.repo_with_most_jobs,
            repo_with_most_jobs_count: count(self.repo_with_most_jobs_count),
            total_active_repositories: count(self.total_active_repositories),
            total_cost: cost(self.total_cost),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryListingWire {
    #[serde(default)]
    repositories: Vec<RepositoryWire>,
    #[serde(default)]
    summary: Option<RepositoryListingSummaryWire>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RepositoryListingSummaryWire {
    most_expensive_repo: Option<String>,
    most_jobs_repo: Option<String>,
    cheapest_repo: Option<String>,
}

impl RepositoryListingWire {
    pub(crate) fn normalize(self) -> RepositoryListing {
        let summary = self.summary.unwrap_or_default();
        RepositoryListing {
            repositories: self
                .repositories
                .into_iter()
                .map(|repo| repo.normalize(None))
                .collect(),
            summary: RepositoryListingSummary {
                most_expensive_repo: summary.most_expensive_repo,
                most_jobs_repo: summary.most_jobs_repo,
                cheapest_repo: summary.cheapest_repo,
            },
        }
    }
}

fn count(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

fn cost(value: Option<f64>) -> f64 {
    sanitize_cost(value.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use costscope_core::UNKNOWN_PLATFORM;

    use super::*;

    #[test]
    fn dashboard_summary_coalesces_null_totals() {
        let wire: DashboardSummaryWire = serde_json::from_str(
            r#"{
                "total_enterprise_ci_cd_cost": null,
                "total_failed_build_cost_enterprise": null,
                "total_runs_enterprise": 0,
                "successful_runs_enterprise": null,
                "failed_runs_enterprise": null
            }"#,
        )
        .expect("decode dashboard summary");

        let overview = wire.normalize();

        assert_eq!(overview.summary, AggregateSummary::default());
        assert_eq!(overview.failed_cost, 0.0);
    }

    #[test]
    fn dashboard_summary_keeps_supplied_success_count() {
        let wire: DashboardSummaryWire = serde_json::from_str(
            r#"{
                "total_enterprise_ci_cd_cost": 120.5,
                "total_failed_build_cost_enterprise": 20.25,
                "total_runs_enterprise": 40,
                "successful_runs_enterprise": 30,
                "failed_runs_enterprise": 8
            }"#,
        )
        .expect("decode dashboard summary");

        let overview = wire.normalize();

        assert_eq!(overview.summary.total_runs, 40);
        assert_eq!(overview.summary.failed_jobs, 8);
        assert_eq!(overview.summary.successful_jobs, 30);
        assert_eq!(overview.failed_cost, 20.25);
    }

    #[test]
    fn platform_cost_rows_become_platform_records() {
        let rows: Vec<PlatformCostWire> = serde_json::from_str(
            r#"[{
                "platform": "GitHub",
                "total_cost_by_platform": 42.0,
                "failed_cost_by_platform": 2.0,
                "total_jobs": 12,
                "successful_jobs": 10,
                "failed_jobs": 2,
                "success_rate_percent": 83.33
            }]"#,
        )
        .expect("decode platform costs");

        let record = rows.into_iter().next().expect("one row").normalize();

        assert_eq!(record.name, "github");
        assert_eq!(record.platform, "github");
        assert_eq!(record.total_jobs, 12);
        assert_eq!(record.failed_jobs, 2);
        assert_eq!(record.total_cost, 42.0);
    }

    #[test]
    fn team_rows_fill_platform_and_clean_optional_fields() {
        let team: TeamWire = serde_json::from_str(
            r#"{
                "team_name": "payments",
                "parent_team_name": null,
                "total_jobs": 5,
                "total_cost": 7.5,
                "depth": -1,
                "repositories": ["billing", ""]
            }"#,
        )
        .expect("decode team");

        let record = team.normalize(Some("gitlab"));

        assert_eq!(record.platform, "gitlab");
        assert_eq!(record.failed_jobs, 0);
        assert_eq!(record.depth, Some(0));
        assert_eq!(record.parent_team, None);
        assert_eq!(record.repositories, Some(vec!["billing".to_owned()]));
    }

    #[test]
    fn repository_rows_without_platform_are_unknown() {
        let repo: RepositoryWire = serde_json::from_str(
            r#"{"repo_name": "infra", "team_name": "ops", "total_jobs": 3, "total_cost": null}"#,
        )
        .expect("decode repo");

        let record = repo.normalize(None);

        assert_eq!(record.platform, UNKNOWN_PLATFORM);
        assert_eq!(record.team.as_deref(), Some("ops"));
        assert_eq!(record.total_cost, 0.0);
    }

    #[test]
    fn team_row_without_name_is_malformed() {
        let result = serde_json::from_str::<TeamWire>(r#"{"total_jobs": 1}"#);
        assert!(result.is_err());
    }
}
