use std::collections::BTreeSet;
use std::fmt;

use costscope_analysis::{SortColumn, SortState};
use costscope_core::{
    AggregateSummary, DashboardOverview, DateRange, EntityRecord, Platform, PlatformOverview,
    RepositoriesOverview, RepositoryListingSummary, TeamsOverview, platform_key,
};
use costscope_source::{DataSource, Operation, SortHint, SourceError, SourceErrorKind};
use serde::Serialize;

/// One screen of the cost dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Dashboard,
    PlatformSummary(Platform),
    PlatformTeams(Platform),
    PlatformRepositories(Platform),
    Teams,
    Repositories,
}

impl PageKind {
    /// Platform keys the page can select from.
    pub fn universe(self, configured: &[String]) -> BTreeSet<String> {
        match self.platform() {
            Some(platform) => BTreeSet::from([platform.as_str().to_owned()]),
            None => configured
                .iter()
                .map(|key| platform_key(Some(key)))
                .collect(),
        }
    }

    pub fn platform(self) -> Option<Platform> {
        match self {
            Self::PlatformSummary(platform)
            | Self::PlatformTeams(platform)
            | Self::PlatformRepositories(platform) => Some(platform),
            Self::Dashboard | Self::Teams | Self::Repositories => None,
        }
    }

    pub fn operations(self) -> &'static [Operation] {
        match self {
            Self::Dashboard => &[Operation::DashboardSummary, Operation::PlatformCosts],
            Self::PlatformSummary(_) => &[
                Operation::PlatformSummary,
                Operation::PlatformRepositories,
            ],
            Self::PlatformTeams(_) => &[
                Operation::PlatformTeamsSummary,
                Operation::PlatformTeams,
            ],
            Self::PlatformRepositories(_) => &[
                Operation::PlatformRepositoriesSummary,
                Operation::PlatformRepositories,
            ],
            Self::Teams => &[Operation::AllTeams],
            Self::Repositories => &[Operation::AllRepositories],
        }
    }

    /// Stable identifier, used as the chart container name.
    pub fn slug(self) -> String {
        match self {
            Self::Dashboard => "dashboard".to_owned(),
            Self::PlatformSummary(platform) => format!("platform-{}", platform.as_str()),
            Self::PlatformTeams(platform) => format!("platform-teams-{}", platform.as_str()),
            Self::PlatformRepositories(platform) => {
                format!("platform-repositories-{}", platform.as_str())
            }
            Self::Teams => "teams".to_owned(),
            Self::Repositories => "repositories".to_owned(),
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

/// Server ordering to request for a local sort column, when the service has one.
pub fn sort_hint_for(sort: SortState) -> Option<SortHint> {
    match sort.sort_key {
        SortColumn::TotalCost => Some(SortHint::TotalCost),
        SortColumn::TotalJobs => Some(SortHint::TotalJobs),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: PageKind,
    pub date_range: DateRange,
    pub sort_hint: Option<SortHint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageOverview {
    Dashboard(DashboardOverview),
    Platform(PlatformOverview),
    Teams(TeamsOverview),
    Repositories(RepositoriesOverview),
}

/// Loaded, normalized data for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub records: Vec<EntityRecord>,
    /// Server total for the whole universe, when the page has one.
    pub population_summary: Option<AggregateSummary>,
    pub overview: Option<PageOverview>,
    pub listing_summary: Option<RepositoryListingSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub operation: Operation,
    pub kind: SourceErrorKind,
    pub message: String,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation.endpoint(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLoad {
    pub data: PageData,
    pub failures: Vec<LoadFailure>,
    pub attempted: usize,
}

impl PageLoad {
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }

    pub fn error_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Applies this load over `previous`, keeping the earlier value of every
    /// part whose operation failed.
    pub fn merged_over(self, mut previous: PageData) -> PageData {
        let mut data = self.data;
        for failure in &self.failures {
            match failure.operation {
                Operation::DashboardSummary | Operation::PlatformSummary => {
                    data.overview = previous.overview.take();
                    data.population_summary = previous.population_summary.take();
                }
                Operation::PlatformTeamsSummary | Operation::PlatformRepositoriesSummary => {
                    data.overview = previous.overview.take();
                }
                Operation::AllRepositories => {
                    data.records = std::mem::take(&mut previous.records);
                    data.listing_summary = previous.listing_summary.take();
                }
                Operation::PlatformCosts
                | Operation::PlatformTeams
                | Operation::PlatformRepositories
                | Operation::AllTeams => {
                    data.records = std::mem::take(&mut previous.records);
                }
            }
        }
        data
    }
}

struct LoadRecorder<'a> {
    page: PageKind,
    source: &'a str,
    load: &'a mut PageLoad,
}

impl LoadRecorder<'_> {
    /// Failed parts degrade to absent; they never abort the page.
    fn keep<T>(&mut self, operation: Operation, result: Result<T, SourceError>) -> Option<T> {
        self.load.attempted += 1;
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    page = %self.page,
                    source = self.source,
                    endpoint = operation.endpoint(),
                    error = %err,
                    "metrics load failed; continuing without it"
                );
                self.load.failures.push(LoadFailure {
                    operation,
                    kind: err.kind(),
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

/// Runs every data-service call the page needs.
pub async fn load_page(source: &dyn DataSource, query: &PageQuery) -> PageLoad {
    let mut load = PageLoad::default();
    let mut data = PageData::default();
    let range = query.date_range;
    let hint = query.sort_hint;

    {
        let mut recorder = LoadRecorder {
            page: query.page,
            source: source.source_name(),
            load: &mut load,
        };

        match query.page {
            PageKind::Dashboard => {
                let overview = recorder.keep(
                    Operation::DashboardSummary,
                    source.dashboard_summary(range).await,
                );
                data.population_summary = overview.map(|overview| overview.summary);
                data.overview = overview.map(PageOverview::Dashboard);
                data.records = recorder
                    .keep(Operation::PlatformCosts, source.platform_costs(range).await)
                    .unwrap_or_default();
            }
            PageKind::PlatformSummary(platform) => {
                let key = platform.as_str();
                let overview = recorder.keep(
                    Operation::PlatformSummary,
                    source.platform_summary(key, range).await,
                );
                data.population_summary = overview.as_ref().map(PlatformOverview::summary);
                data.overview = overview.map(PageOverview::Platform);
                data.records = recorder
                    .keep(
                        Operation::PlatformRepositories,
                        source.platform_repositories(key, range, hint).await,
                    )
                    .unwrap_or_default();
            }
            PageKind::PlatformTeams(platform) => {
                let key = platform.as_str();
                data.overview = recorder
                    .keep(
                        Operation::PlatformTeamsSummary,
                        source.platform_teams_summary(key, range).await,
                    )
                    .map(PageOverview::Teams);
                data.records = recorder
                    .keep(
                        Operation::PlatformTeams,
                        source.platform_teams(key, range, hint).await,
                    )
                    .unwrap_or_default();
            }
            PageKind::PlatformRepositories(platform) => {
                let key = platform.as_str();
                data.overview = recorder
                    .keep(
                        Operation::PlatformRepositoriesSummary,
                        source.platform_repositories_summary(key, range).await,
                    )
                    .map(PageOverview::Repositories);
                data.records = recorder
                    .keep(
                        Operation::PlatformRepositories,
                        source.platform_repositories(key, range, hint).await,
                    )
                    .unwrap_or_default();
            }
            PageKind::Teams => {
                data.records = recorder
                    .keep(Operation::AllTeams, source.all_teams(range, hint).await)
                    .unwrap_or_default();
            }
            PageKind::Repositories => {
                if let Some(listing) = recorder.keep(
                    Operation::AllRepositories,
                    source.all_repositories(range, hint).await,
                ) {
                    data.records = listing.repositories;
                    data.listing_summary = Some(listing.summary);
                }
            }
        }
    }

    load.data = data;
    load
}
