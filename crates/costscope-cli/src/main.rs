use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use costscope_analysis::SortColumn;
use costscope_cli::report::{
    OutputFormat, PageName, PageRequest, run_page_once, write_chart, write_report,
};
use costscope_config::{ensure_workspace_config, validate_config};
use costscope_core::{DateRange, Platform};
use costscope_source::HttpDataSource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(author, version, about = "CI/CD cost and usage analytics")]
struct Cli {
    #[arg(long, default_value = ".", help = "Workspace root holding .costscope/config.toml")]
    workspace: PathBuf,

    #[arg(
        value_parser = parse_page_name,
        help = "Page: dashboard, platform, platform-teams, platform-repositories, teams, or repositories"
    )]
    page: PageName,

    #[arg(long, value_parser = parse_platform, help = "Platform for the per-platform pages")]
    platform: Option<Platform>,

    #[arg(long, value_parser = parse_date_range, help = "Date range: 7d, 30d, 6m, 1y, or all")]
    range: Option<DateRange>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated platform keys to select (defaults to every configured platform)"
    )]
    select: Option<Vec<String>>,

    #[arg(
        long,
        value_parser = parse_sort_column,
        help = "Sort by column; repeat a column to flip its direction"
    )]
    sort: Vec<SortColumn>,

    #[arg(long, help = "Group rows by platform")]
    group: bool,

    #[arg(long, help = "Only list rows whose name contains this text")]
    search: Option<String>,

    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    output: OutputFormat,

    #[arg(long, help = "Directory to write the Vega-Lite chart document into")]
    chart_dir: Option<PathBuf>,

    #[arg(long, help = "Data service base URL, overriding [service].base_url")]
    base_url: Option<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = parse_cli();
    run(cli)
}

fn parse_cli() -> Cli {
    let mut args: Vec<_> = env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("COSTSCOPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("costscope=info,warn"));
    let format = env::var("COSTSCOPE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_owned());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    let config = ensure_workspace_config(&workspace).with_context(|| {
        format!(
            "failed to load or create workspace config at {}",
            costscope_config::config_path(&workspace).display()
        )
    })?;
    for warning in validate_config(&config) {
        eprintln!(
            "costscope config warning [{}]: {}",
            warning.code, warning.message
        );
    }

    let page = cli
        .page
        .into_page(cli.platform)
        .map_err(anyhow::Error::msg)?;
    let source = match cli.base_url.as_deref() {
        Some(base_url) => HttpDataSource::new(base_url),
        None => HttpDataSource::from_config(&config.service),
    }
    .context("failed to configure data service client")?;

    let request = PageRequest {
        range: cli.range,
        select: cli.select,
        sort: cli.sort,
        group: cli.group,
        search: cli.search,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let view = runtime.block_on(run_page_once(&source, &config, page, &request));

    if let Some(error) = view.last_error() {
        tracing::warn!(page = %page, error, "page loaded with failures");
    }

    let mut out = std::io::stdout().lock();
    write_report(&view, cli.output, &mut out)?;

    if let Some(dir) = cli.chart_dir.as_deref() {
        match write_chart(&view, dir)? {
            Some(path) => eprintln!("costscope: chart written to {}", path.display()),
            None => eprintln!("costscope: nothing to chart for {page}"),
        }
    }

    Ok(())
}

fn parse_page_name(value: &str) -> Result<PageName, String> {
    value.parse()
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    value.parse()
}

fn parse_date_range(value: &str) -> Result<DateRange, String> {
    value.parse()
}

fn parse_sort_column(value: &str) -> Result<SortColumn, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}
