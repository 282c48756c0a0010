use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use costscope_core::{
    AggregateSummary, DashboardOverview, DateRange, EntityRecord, PlatformOverview,
    RepositoriesOverview, RepositoryListing, RepositoryListingSummary, TeamsOverview,
    platform_key,
};

use crate::{DataSource, Operation, SortHint, SourceError};

pub const IN_MEMORY_SOURCE_NAME: &str = "memory";

/// Everything the service would report for one date range.
///
/// `teams` and `repositories` carry their platform, so per-platform listings
/// and overviews are derived from them. `dashboard` overrides the totals that
/// would otherwise be folded from `platform_costs`.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub dashboard: Option<DashboardOverview>,
    pub platform_costs: Vec<EntityRecord>,
    pub teams: Vec<EntityRecord>,
    pub repositories: Vec<EntityRecord>,
}

/// Fixture-backed source for offline use and tests.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    snapshots: HashMap<DateRange, Snapshot>,
    failing: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<(Operation, DateRange)>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, range: DateRange, snapshot: Snapshot) -> Self {
        self.snapshots.insert(range, snapshot);
        self
    }

    /// Makes every later call to `operation` fail as a transport error.
    pub fn fail(&self, operation: Operation) -> Result<(), SourceError> {
        self.failing_guard()?.insert(operation);
        Ok(())
    }

    pub fn recover(&self, operation: Operation) -> Result<(), SourceError> {
        self.failing_guard()?.remove(&operation);
        Ok(())
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Result<Vec<(Operation, DateRange)>, SourceError> {
        let calls = self
            .calls
            .lock()
            .map_err(|_| SourceError::LockPoisoned("memory source call log".to_owned()))?;
        Ok(calls.clone())
    }

    fn failing_guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashSet<Operation>>, SourceError> {
        self.failing
            .lock()
            .map_err(|_| SourceError::LockPoisoned("memory source failures".to_owned()))
    }

    fn enter(&self, operation: Operation, range: DateRange) -> Result<Snapshot, SourceError> {
        self.calls
            .lock()
            .map_err(|_| SourceError::LockPoisoned("memory source call log".to_owned()))?
            .push((operation, range));

        if self.failing_guard()?.contains(&operation) {
            return Err(SourceError::Unavailable(format!(
                "{} is offline",
                operation.endpoint()
            )));
        }

        Ok(self.snapshots.get(&range).cloned().unwrap_or_default())
    }
}

fn on_platform(records: &[EntityRecord], platform: &str) -> Vec<EntityRecord> {
    let key = platform_key(Some(platform));
    records
        .iter()
        .filter(|record| record.platform_key() == key)
        .cloned()
        .collect()
}

fn apply_hint(mut records: Vec<EntityRecord>, sort_hint: Option<SortHint>) -> Vec<EntityRecord> {
    match sort_hint {
        Some(SortHint::TotalCost) => {
            records.sort_by(|left, right| right.total_cost.total_cmp(&left.total_cost))
        }
        Some(SortHint::TotalJobs) => {
            records.sort_by(|left, right| right.total_jobs.cmp(&left.total_jobs))
        }
        None => {}
    }
    records
}

fn first_max_by<F>(records: &[EntityRecord], key: F) -> Option<&EntityRecord>
where
    F: Fn(&EntityRecord) -> f64,
{
    records.iter().fold(None, |best, record| match best {
        Some(current) if key(record) <= key(current) => Some(current),
        _ => Some(record),
    })
}

fn first_min_by<F>(records: &[EntityRecord], key: F) -> Option<&EntityRecord>
where
    F: Fn(&EntityRecord) -> f64,
{
    first_max_by(records, |record| -key(record))
}

fn fold(records: &[EntityRecord]) -> AggregateSummary {
    let mut summary = AggregateSummary::default();
    for record in records {
        summary.add_record(record);
    }
    summary
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    async fn dashboard_summary(&self, range: DateRange) -> Result<DashboardOverview, SourceError> {
        let snapshot = self.enter(Operation::DashboardSummary, range)?;
        Ok(snapshot.dashboard.unwrap_or_else(|| DashboardOverview {
            summary: fold(&snapshot.platform_costs),
            failed_cost: 0.0,
        }))
    }

    async fn platform_costs(&self, range: DateRange) -> Result<Vec<EntityRecord>, SourceError> {
        Ok(self.enter(Operation::PlatformCosts, range)?.platform_costs)
    }

    async fn platform_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<PlatformOverview, SourceError> {
        let snapshot = self.enter(Operation::PlatformSummary, range)?;
        let repositories = on_platform(&snapshot.repositories, platform);
        let totals = fold(&repositories);
        let most_costly = first_max_by(&repositories, |record| record.total_cost);

        Ok(PlatformOverview {
            platform: platform_key(Some(platform)),
            total_cost: totals.total_cost,
            total_jobs: totals.total_runs,
            failed_jobs: totals.failed_jobs,
            most_costly_repo: most_costly.map(|record| record.name.clone()),
            most_costly_repo_cost: most_costly.map_or(0.0, |record| record.total_cost),
        })
    }

    async fn platform_teams(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let snapshot = self.enter(Operation::PlatformTeams, range)?;
        Ok(apply_hint(on_platform(&snapshot.teams, platform), sort_hint))
    }

    async fn platform_teams_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<TeamsOverview, SourceError> {
        let snapshot = self.enter(Operation::PlatformTeamsSummary, range)?;
        let teams = on_platform(&snapshot.teams, platform);
        let totals = fold(&teams);
        let most_costly = first_max_by(&teams, |record| record.total_cost);
        let most_jobs = first_max_by(&teams, |record| record.total_jobs as f64);
        let most_failed = first_max_by(&teams, |record| record.failed_jobs as f64);

        Ok(TeamsOverview {
            platform: platform_key(Some(platform)),
            most_costly_team: most_costly.map(|record| record.name.clone()),
            most_costly_team_cost: most_costly.map_or(0.0, |record| record.total_cost),
            team_with_most_jobs: most_jobs.map(|record| record.name.clone()),
            team_with_most_jobs_count: most_jobs.map_or(0, |record| record.total_jobs),
            team_with_most_failed_jobs: most_failed.map(|record| record.name.clone()),
            team_with_most_failed_jobs_count: most_failed.map_or(0, |record| record.failed_jobs),
            total_active_teams: teams.iter().filter(|record| record.total_jobs > 0).count() as u64,
            total_cost: totals.total_cost,
            total_jobs_count: totals.total_runs,
        })
    }

    async fn platform_repositories(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let snapshot = self.enter(Operation::PlatformRepositories, range)?;
        Ok(apply_hint(
            on_platform(&snapshot.repositories, platform),
            sort_hint,
        ))
    }

    async fn platform_repositories_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<RepositoriesOverview, SourceError> {
        let snapshot = self.enter(Operation::PlatformRepositoriesSummary, range)?;
        let repositories = on_platform(&snapshot.repositories, platform);
        let most_costly = first_max_by(&repositories, |record| record.total_cost);
        let most_jobs = first_max_by(&repositories, |record| record.total_jobs as f64);

        Ok(RepositoriesOverview {
            platform: platform_key(Some(platform)),
            most_costly_repo: most_costly.map(|record| record.name.clone()),
            most_costly_repo_cost: most_costly.map_or(0.0, |record| record.total_cost),
            repo_with_most_jobs: most_jobs.map(|record| record.name.clone()),
            repo_with_most_jobs_count: most_jobs.map_or(0, |record| record.total_jobs),
            total_active_repositories: repositories
                .iter()
                .filter(|record| record.total_jobs > 0)
                .count() as u64,
            total_cost: fold(&repositories).total_cost,
        })
    }

    async fn all_teams(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let snapshot = self.enter(Operation::AllTeams, range)?;
        Ok(apply_hint(snapshot.teams, sort_hint))
    }

    async fn all_repositories(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<RepositoryListing, SourceError> {
        let snapshot = self.enter(Operation::AllRepositories, range)?;
        let repositories = apply_hint(snapshot.repositories, sort_hint);
        let summary = RepositoryListingSummary {
            most_expensive_repo: first_max_by(&repositories, |record| record.total_cost)
                .map(|record| record.name.clone()),
            most_jobs_repo: first_max_by(&repositories, |record| record.total_jobs as f64)
                .map(|record| record.name.clone()),
            cheapest_repo: first_min_by(&repositories, |record| record.total_cost)
                .map(|record| record.name.clone()),
        };

        Ok(RepositoryListing {
            repositories,
            summary,
        })
    }

    fn source_name(&self) -> &str {
        IN_MEMORY_SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    fn fixture() -> InMemoryDataSource {
        InMemoryDataSource::new().with_snapshot(
            DateRange::Last30Days,
            Snapshot {
                dashboard: None,
                platform_costs: vec![
                    EntityRecord::new("github", "github")
                        .with_jobs(10, 2)
                        .with_cost(30.0),
                    EntityRecord::new("gitlab", "gitlab")
                        .with_jobs(4, 1)
                        .with_cost(10.0),
                ],
                teams: vec![
                    EntityRecord::new("platform", "github")
                        .with_jobs(6, 0)
                        .with_cost(12.0),
                    EntityRecord::new("payments", "github")
                        .with_jobs(4, 2)
                        .with_cost(18.0),
                    EntityRecord::new("mobile", "gitlab")
                        .with_jobs(4, 1)
                        .with_cost(10.0),
                ],
                repositories: vec![
                    EntityRecord::new("api", "github")
                        .with_jobs(7, 1)
                        .with_cost(20.0),
                    EntityRecord::new("web", "github")
                        .with_jobs(3, 1)
                        .with_cost(10.0),
                    EntityRecord::new("app", "gitlab")
                        .with_jobs(4, 1)
                        .with_cost(10.0),
                ],
            },
        )
    }

    #[tokio::test]
    async fn dashboard_summary_folds_platform_costs() {
        let source = fixture();

        let overview = source
            .dashboard_summary(DateRange::Last30Days)
            .await
            .expect("dashboard");

        assert_eq!(overview.summary.total_cost, 40.0);
        assert_eq!(overview.summary.total_runs, 14);
        assert_eq!(overview.summary.failed_jobs, 3);
        assert_eq!(overview.summary.successful_jobs, 11);
    }

    #[tokio::test]
    async fn unknown_range_reports_empty_data() {
        let source = fixture();

        let costs = source
            .platform_costs(DateRange::Last7Days)
            .await
            .expect("costs");

        assert!(costs.is_empty());
    }

    #[tokio::test]
    async fn per_platform_listings_filter_and_sort_by_hint() {
        let source = fixture();

        let teams = source
            .platform_teams("GitHub", DateRange::Last30Days, Some(SortHint::TotalCost))
            .await
            .expect("teams");

        let names = teams.iter().map(|team| team.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["payments", "platform"]);

        let summary = source
            .platform_teams_summary("github", DateRange::Last30Days)
            .await
            .expect("teams summary");
        assert_eq!(summary.most_costly_team.as_deref(), Some("payments"));
        assert_eq!(summary.team_with_most_jobs.as_deref(), Some("platform"));
        assert_eq!(summary.total_active_teams, 2);
        assert_eq!(summary.total_jobs_count, 10);
    }

    #[tokio::test]
    async fn repository_listing_carries_summary() {
        let source = fixture();

        let listing = source
            .all_repositories(DateRange::Last30Days, None)
            .await
            .expect("repositories");

        assert_eq!(listing.repositories.len(), 3);
        assert_eq!(listing.summary.most_expensive_repo.as_deref(), Some("api"));
        assert_eq!(listing.summary.most_jobs_repo.as_deref(), Some("api"));
        assert_eq!(listing.summary.cheapest_repo.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_transport_errors() {
        let source = fixture();
        source.fail(Operation::AllTeams).expect("inject failure");

        let err = source
            .all_teams(DateRange::Last30Days, None)
            .await
            .expect_err("offline");
        assert_eq!(err.kind(), SourceErrorKind::TransportFailure);

        source.recover(Operation::AllTeams).expect("recover");
        let teams = source
            .all_teams(DateRange::Last30Days, None)
            .await
            .expect("teams");
        assert_eq!(teams.len(), 3);

        let calls = source.calls().expect("calls");
        assert_eq!(
            calls,
            vec![
                (Operation::AllTeams, DateRange::Last30Days),
                (Operation::AllTeams, DateRange::Last30Days),
            ]
        );
    }
}
