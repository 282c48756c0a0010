use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use costscope_core::DateRange;
use costscope_source::{DataSource, HttpDataSource, SortHint, SourceErrorKind};
use serde_json::{Value, json};

async fn spawn_service() -> String {
    let router = Router::new()
        .route(
            "/api/dashboard-summary",
            get(|| async {
                Json(json!({
                    "total_enterprise_ci_cd_cost": 60.0,
                    "total_failed_build_cost_enterprise": 6.5,
                    "total_runs_enterprise": 30,
                    "successful_runs_enterprise": 25,
                    "failed_runs_enterprise": 5
                }))
            }),
        )
        .route(
            "/api/platform-costs",
            get(|| async {
                Json(json!([
                    {
                        "platform": "github",
                        "total_cost_by_platform": 15.0,
                        "failed_cost_by_platform": 1.0,
                        "total_jobs": 10,
                        "successful_jobs": 8,
                        "failed_jobs": 2,
                        "success_rate_percent": 80.0
                    },
                    {
                        "platform": "GitLab",
                        "total_cost_by_platform": 45.0,
                        "failed_cost_by_platform": null,
                        "total_jobs": 20,
                        "successful_jobs": 17,
                        "failed_jobs": 3,
                        "success_rate_percent": 85.0
                    }
                ]))
            }),
        )
        .route(
            "/api/platform-teams",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!([
                    {
                        "team_name": params.get("platform").cloned().unwrap_or_default(),
                        "parent_team_name": null,
                        "total_jobs": 3,
                        "total_cost": 1.5,
                        "depth": 0,
                        "repositories": ["a", "b"]
                    },
                    {
                        "team_name": params.get("range").cloned().unwrap_or_default(),
                        "parent_team_name": "root",
                        "total_jobs": 1,
                        "total_cost": 0.5,
                        "depth": 1,
                        "repositories": []
                    },
                    {
                        "team_name": params.get("sort_by").cloned().unwrap_or_default(),
                        "total_jobs": 0,
                        "total_cost": 0.0,
                        "depth": 1
                    }
                ]))
            }),
        )
        .route(
            "/api/repositories",
            get(|| async {
                Json(json!({
                    "repositories": [
                        {"repo_name": "api", "team_name": "core", "total_jobs": 9, "total_cost": 12.0, "platform": "github"},
                        {"repo_name": "docs", "team_name": null, "total_jobs": 1, "total_cost": 0.25, "platform": "bitbucket"}
                    ],
                    "summary": {
                        "most_expensive_repo": "api",
                        "most_jobs_repo": "api",
                        "cheapest_repo": "docs"
                    }
                }))
            }),
        )
        .route(
            "/api/teams",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))) }),
        )
        .route(
            "/api/platform-summary",
            get(|| async { Json(Value::String("not an object".to_owned())) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });

    format!("http://{addr}/api")
}

#[tokio::test]
async fn dashboard_summary_and_platform_costs_are_normalized() {
    let base_url = spawn_service().await;
    let source = HttpDataSource::new(base_url).expect("http source");

    let overview = source
        .dashboard_summary(DateRange::Last30Days)
        .await
        .expect("dashboard summary");
    assert_eq!(overview.summary.total_cost, 60.0);
    assert_eq!(overview.summary.total_runs, 30);
    assert_eq!(overview.summary.successful_jobs, 25);
    assert_eq!(overview.failed_cost, 6.5);

    let costs = source
        .platform_costs(DateRange::Last30Days)
        .await
        .expect("platform costs");
    let keys = costs.iter().map(|r| r.platform.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["github", "gitlab"]);
    assert_eq!(costs[1].total_cost, 45.0);
    assert_eq!(costs[1].failed_jobs, 3);
}

#[tokio::test]
async fn listing_requests_forward_platform_range_and_sort_hint() {
    let base_url = spawn_service().await;
    let source = HttpDataSource::new(base_url).expect("http source");

    let teams = source
        .platform_teams("gitlab", DateRange::Last6Months, Some(SortHint::TotalJobs))
        .await
        .expect("platform teams");

    let names = teams.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["gitlab", "6mo", "total_jobs"]);
    assert!(teams.iter().all(|t| t.platform == "gitlab"));
    assert_eq!(teams[1].parent_team.as_deref(), Some("root"));
    assert_eq!(teams[0].repositories.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn repository_listing_keeps_service_summary() {
    let base_url = spawn_service().await;
    let source = HttpDataSource::new(base_url).expect("http source");

    let listing = source
        .all_repositories(DateRange::LastYear, None)
        .await
        .expect("repositories");

    assert_eq!(listing.repositories.len(), 2);
    assert_eq!(listing.repositories[1].platform, "bitbucket");
    assert_eq!(listing.repositories[1].team, None);
    assert_eq!(listing.summary.cheapest_repo.as_deref(), Some("docs"));
}

#[tokio::test]
async fn error_status_and_bad_payloads_map_to_error_kinds() {
    let base_url = spawn_service().await;
    let source = HttpDataSource::new(base_url).expect("http source");

    let status_err = source
        .all_teams(DateRange::Last7Days, None)
        .await
        .expect_err("server error");
    assert_eq!(status_err.kind(), SourceErrorKind::TransportFailure);

    let shape_err = source
        .platform_summary("github", DateRange::Last7Days)
        .await
        .expect_err("bad payload");
    assert_eq!(shape_err.kind(), SourceErrorKind::MalformedResponse);
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);

    let source = HttpDataSource::new(format!("http://{addr}/api")).expect("http source");
    let err = source
        .platform_costs(DateRange::Last30Days)
        .await
        .expect_err("connection refused");

    assert_eq!(err.kind(), SourceErrorKind::TransportFailure);
}
