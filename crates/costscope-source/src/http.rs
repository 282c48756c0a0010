use async_trait::async_trait;
use costscope_config::ServiceConfig;
use costscope_core::{
    DashboardOverview, DateRange, EntityRecord, PlatformOverview, RepositoriesOverview,
    RepositoryListing, TeamsOverview,
};
use serde::de::DeserializeOwned;

use crate::wire::{
    DashboardSummaryWire, PlatformCostWire, PlatformSummaryWire, RepositoriesSummaryWire,
    RepositoryListingWire, RepositoryWire, TeamWire, TeamsSummaryWire,
};
use crate::{DataSource, Operation, SortHint, SourceError};

pub const HTTP_SOURCE_NAME: &str = "http";

/// Talks to the metrics service over its JSON GET endpoints.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        reqwest::Url::parse(&base_url)
            .map_err(|err| SourceError::InvalidUrl(format!("{base_url}: {err}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, SourceError> {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(
        &self,
        operation: Operation,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Url, SourceError> {
        let raw = format!("{}/{}", self.base_url, operation.endpoint());
        reqwest::Url::parse_with_params(&raw, params)
            .map_err(|err| SourceError::InvalidUrl(format!("{raw}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = self.endpoint_url(operation, params)?;
        tracing::debug!(url = %url, "requesting metrics");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint: operation.endpoint().to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(
                endpoint = operation.endpoint(),
                error = %err,
                "metrics response did not match expected shape"
            );
            SourceError::Json(err)
        })
    }
}

fn listing_params<'a>(
    platform: Option<&'a str>,
    range: DateRange,
    sort_hint: Option<SortHint>,
) -> Vec<(&'a str, &'a str)> {
    let mut params = Vec::with_capacity(3);
    if let Some(platform) = platform {
        params.push(("platform", platform));
    }
    params.push(("range", range.query_value()));
    if let Some(hint) = sort_hint {
        params.push(("sort_by", hint.as_str()));
    }
    params
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn dashboard_summary(&self, range: DateRange) -> Result<DashboardOverview, SourceError> {
        let wire: DashboardSummaryWire = self
            .get_json(
                Operation::DashboardSummary,
                &listing_params(None, range, None),
            )
            .await?;
        Ok(wire.normalize())
    }

    async fn platform_costs(&self, range: DateRange) -> Result<Vec<EntityRecord>, SourceError> {
        let rows: Vec<PlatformCostWire> = self
            .get_json(Operation::PlatformCosts, &listing_params(None, range, None))
            .await?;
        Ok(rows.into_iter().map(PlatformCostWire::normalize).collect())
    }

    async fn platform_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<PlatformOverview, SourceError> {
        let wire: PlatformSummaryWire = self
            .get_json(
                Operation::PlatformSummary,
                &listing_params(Some(platform), range, None),
            )
            .await?;
        Ok(wire.normalize(platform))
    }

    async fn platform_teams(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let rows: Vec<TeamWire> = self
            .get_json(
                Operation::PlatformTeams,
                &listing_params(Some(platform), range, sort_hint),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.normalize(Some(platform)))
            .collect())
    }

    async fn platform_teams_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<TeamsOverview, SourceError> {
        let wire: TeamsSummaryWire = self
            .get_json(
                Operation::PlatformTeamsSummary,
                &listing_params(Some(platform), range, None),
            )
            .await?;
        Ok(wire.normalize(platform))
    }

    async fn platform_repositories(
        &self,
        platform: &str,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let rows: Vec<RepositoryWire> = self
            .get_json(
                Operation::PlatformRepositories,
                &listing_params(Some(platform), range, sort_hint),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.normalize(Some(platform)))
            .collect())
    }

    async fn platform_repositories_summary(
        &self,
        platform: &str,
        range: DateRange,
    ) -> Result<RepositoriesOverview, SourceError> {
        let wire: RepositoriesSummaryWire = self
            .get_json(
                Operation::PlatformRepositoriesSummary,
                &listing_params(Some(platform), range, None),
            )
            .await?;
        Ok(wire.normalize(platform))
    }

    async fn all_teams(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<Vec<EntityRecord>, SourceError> {
        let rows: Vec<TeamWire> = self
            .get_json(Operation::AllTeams, &listing_params(None, range, sort_hint))
            .await?;
        Ok(rows.into_iter().map(|row| row.normalize(None)).collect())
    }

    async fn all_repositories(
        &self,
        range: DateRange,
        sort_hint: Option<SortHint>,
    ) -> Result<RepositoryListing, SourceError> {
        let wire: RepositoryListingWire = self
            .get_json(
                Operation::AllRepositories,
                &listing_params(None, range, sort_hint),
            )
            .await?;
        Ok(wire.normalize())
    }

    fn source_name(&self) -> &str {
        HTTP_SOURCE_NAME
    }
}
