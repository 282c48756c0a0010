use std::collections::BTreeSet;

use costscope_analysis::{ChartDimensions, SortColumn, summaries_agree, summarize_all};
use costscope_config::CostscopeConfig;
use costscope_core::{AggregateSummary, DashboardOverview, DateRange, EntityRecord};
use costscope_source::{InMemoryDataSource, Operation, Snapshot};
use costscope_view::{
    PageData, PageKind, PageOverview, SelectionState, ViewContext, ViewCoordinator, ViewPhase,
    derive_view, load_page,
};
use proptest::prelude::*;

fn platform_costs() -> Vec<EntityRecord> {
    vec![
        EntityRecord::new("github", "github")
            .with_jobs(120, 12)
            .with_cost(64.5),
        EntityRecord::new("gitlab", "gitlab")
            .with_jobs(40, 8)
            .with_cost(21.25),
        EntityRecord::new("bitbucket", "bitbucket")
            .with_jobs(0, 0)
            .with_cost(0.0),
    ]
}

fn source() -> InMemoryDataSource {
    let costs = platform_costs();
    InMemoryDataSource::new()
        .with_snapshot(
            DateRange::Last30Days,
            Snapshot {
                dashboard: Some(DashboardOverview {
                    summary: summarize_all(&costs),
                    failed_cost: 9.75,
                }),
                platform_costs: costs,
                teams: Vec::new(),
                repositories: vec![
                    EntityRecord {
                        team: Some("core".to_owned()),
                        ..EntityRecord::new("api", "github")
                            .with_jobs(90, 10)
                            .with_cost(50.0)
                    },
                    EntityRecord::new("site", "gitlab")
                        .with_jobs(40, 8)
                        .with_cost(21.25),
                ],
            },
        )
        .with_snapshot(
            DateRange::Last7Days,
            Snapshot {
                platform_costs: vec![
                    EntityRecord::new("github", "github")
                        .with_jobs(3, 0)
                        .with_cost(1.5),
                ],
                ..Snapshot::default()
            },
        )
}

#[tokio::test]
async fn dashboard_uses_server_totals_for_full_selection() {
    let source = source();
    let mut view = ViewCoordinator::from_config(PageKind::Dashboard, &CostscopeConfig::default());

    assert!(view.refresh(&source).await);

    let summary = view.current_summary().expect("summary");
    assert_eq!(summary.total_runs, 160);
    assert_eq!(summary.failed_jobs, 20);
    assert!(summaries_agree(&summary, &summarize_all(&platform_costs())));
    assert!(matches!(
        view.data().and_then(|data| data.overview.as_ref()),
        Some(PageOverview::Dashboard(overview)) if overview.failed_cost == 9.75
    ));

    let chart = view.current_chart_spec().expect("cost share chart");
    assert_eq!(chart.cost_shares().len(), 3);
}

#[tokio::test]
async fn server_totals_win_over_local_fold_until_selection_narrows() {
    let server = AggregateSummary::from_counts(500.0, 900, 45);
    let source = InMemoryDataSource::new().with_snapshot(
        DateRange::Last30Days,
        Snapshot {
            dashboard: Some(DashboardOverview {
                summary: server,
                failed_cost: 0.0,
            }),
            platform_costs: platform_costs(),
            ..Snapshot::default()
        },
    );
    let mut view = ViewCoordinator::from_config(PageKind::Dashboard, &CostscopeConfig::default());

    assert!(view.refresh(&source).await);

    assert_eq!(view.current_summary(), Some(server));
    assert_eq!(view.last_error(), None);
    assert_eq!(view.current_ordered_rows().len(), 3);

    let ticket = view
        .set_selected_platforms(["github", "gitlab"])
        .expect("selection change reloads");
    let load = load_page(&source, &view.query()).await;
    assert!(view.complete_load(ticket, load));

    let summary = view.current_summary().expect("summary");
    assert_eq!(summary.total_runs, 160);
    assert_eq!(summary.failed_jobs, 20);
    assert_eq!(summary.total_cost, 85.75);
}

#[tokio::test]
async fn range_change_reloads_and_narrowing_switches_chart() {
    let source = source();
    let mut view = ViewCoordinator::from_config(PageKind::Dashboard, &CostscopeConfig::default());
    view.refresh(&source).await;

    let ticket = view
        .set_date_range(DateRange::Last7Days)
        .expect("range change reloads");
    let load = load_page(&source, &view.query()).await;
    assert!(view.complete_load(ticket, load));
    assert_eq!(view.current_summary().map(|s| s.total_runs), Some(3));

    let ticket = view
        .set_selected_platforms(["github"])
        .expect("selection change reloads");
    assert_eq!(view.phase(), ViewPhase::Ready { stale_pending: true });
    let load = load_page(&source, &view.query()).await;
    view.complete_load(ticket, load);

    let chart = view.current_chart_spec().expect("job breakdown chart");
    let counts = chart.job_counts();
    assert_eq!(counts[0].count + counts[1].count, 3);
}

#[tokio::test]
async fn repositories_page_keeps_listing_summary_and_survives_outage() {
    let source = source();
    let mut view =
        ViewCoordinator::from_config(PageKind::Repositories, &CostscopeConfig::default());
    view.refresh(&source).await;

    let listing = view
        .data()
        .and_then(|data| data.listing_summary.clone())
        .expect("listing summary");
    assert_eq!(listing.most_expensive_repo.as_deref(), Some("api"));
    assert_eq!(view.current_highlights().cheapest.as_deref(), Some("site"));

    source
        .fail(Operation::AllRepositories)
        .expect("inject failure");
    view.sort_by(SortColumn::TotalJobs);
    assert!(view.refresh(&source).await);

    assert_eq!(view.current_ordered_rows().len(), 2);
    assert!(
        view.last_error()
            .expect("error recorded")
            .contains("repositories")
    );
}

fn record_strategy() -> impl Strategy<Value = EntityRecord> {
    (
        "[a-z]{1,5}",
        prop_oneof![Just("github"), Just("gitlab"), Just("bitbucket")],
        0u64..200,
        0u64..200,
        0u32..5_000,
    )
        .prop_map(|(name, platform, total, failed, cents)| {
            EntityRecord::new(name, platform)
                .with_jobs(total, failed)
                .with_cost(f64::from(cents) / 100.0)
        })
}

proptest! {
    #[test]
    fn prop_derive_view_is_pure_and_folds_selection(
        records in proptest::collection::vec(record_strategy(), 0..30),
        keep_github in any::<bool>(),
        keep_gitlab in any::<bool>(),
    ) {
        let context = ViewContext {
            universe: BTreeSet::from([
                "bitbucket".to_owned(),
                "github".to_owned(),
                "gitlab".to_owned(),
            ]),
            dimensions: ChartDimensions::default(),
        };
        let mut keys = vec!["bitbucket"];
        if keep_github {
            keys.push("github");
        }
        if keep_gitlab {
            keys.push("gitlab");
        }
        let selection = SelectionState::for_universe(&context.universe, DateRange::default())
            .with_selected_keys(keys, &context.universe);
        let data = PageData {
            records,
            ..PageData::default()
        };

        let first = derive_view(&data, &selection, &context);
        let second = derive_view(&data, &selection, &context);
        prop_assert_eq!(&first, &second);

        let expected = data
            .records
            .iter()
            .filter(|r| selection.selected_keys.contains(&r.platform))
            .fold(AggregateSummary::default(), |mut acc, r| {
                acc.add_record(r);
                acc
            });
        prop_assert!(summaries_agree(&first.summary, &expected));
        prop_assert_eq!(first.rows.len(), data
            .records
            .iter()
            .filter(|r| selection.selected_keys.contains(&r.platform))
            .count());
    }
}
