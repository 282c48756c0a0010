use async_trait::async_trait;
use costscope_core::{
    DashboardOverview, DateRange, EntityRecord, PlatformOverview, RepositoriesOverview,
    RepositoryListing, TeamsOverview,
};
use thiserror::Error;

mod http;
mod memory;
mod wire;

pub use http::{HTTP_SOURCE_NAME, HttpDataSource};
pub use memory::{IN_MEMORY_SOURCE_NAME, InMemoryDataSource, Snapshot};

/// Server-side ordering the data service accepts for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortHint {
    #[default]
    TotalCost,
    TotalJobs,
}

impl SortHint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TotalCost => "total_cost",
            Self::TotalJobs => "total_jobs",
        }
    }
}

/// One call the data-access collaborator can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DashboardSummary,
    PlatformCosts,
    PlatformSummary,
    PlatformTeams,
    PlatformTeamsSummary,
    PlatformRepositories,
    PlatformRepositoriesSummary,
    AllTeams,
    AllRepositories,
}

impl Operation {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::DashboardSummary => "dashboard-summary",
            Self::PlatformCosts => "platform-costs",
            Self::PlatformSummary => "platform-summary",
            Self::PlatformTeams => "platform-teams",
            Self::PlatformTeamsSummary => "platform-teams-summary",
            Self::PlatformRepositories => "platform-repositories",
            Self::PlatformRepositoriesSummary => "platform-repositories-summary",
            Self::AllTeams => "teams",
            Self::AllRepositories => "repositories",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    TransportFailure,
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("data service answered {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("invalid data service URL: {0}")]
    InvalidUrl(String),
    #[error("data service unavailable: {0}")]
    Unavailable(String),
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("response decoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Request(err) if err.is_decode() => SourceErrorKind::MalformedResponse,
            Self::Json(_) => SourceErrorKind::MalformedResponse,
            Self::Request(_)
            | Self::Status { .. }
            | Self::InvalidUrl(_)
            | Self::Unavailable(_)
            | Self::LockPoisoned(_) => SourceErrorKind::TransportFailure,
        }
    }
}

/// Data-access collaborator for the CI/CD metrics service.
///
/// Every listing comes back normalized: numbers that were absent are zero,
/// `failed_jobs` never exceeds `total_jobs`, platform keys are lowercase.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn dashboard_summary(&self, range: DateRange) -> Result<DashboardOverview, SourceError>;

    async fn platform_costs(&self, range: DateRange) -> Result<Vec<EntityRecord>, SourceError>;

    async fn platform_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<PlatformOverview, SourceError>;

    async fn platform_teams(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError>;

    async fn platform_teams_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<TeamsOverview, SourceError>;

    async fn platform_repositories(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError>;

    async fn platform_repositories_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<RepositoriesOverview, SourceError>;

    async fn all_teams(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError>;

    async fn all_repositories(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<RepositoryListing, SourceError>;

    fn source_name(&self) -> &str;
}
