// Console front end.
//
// One run is one interaction: load the table, apply the selection given on
// the command line, then print the dashboard sections and write any
// requested exports.
use clap::Parser;
use covid_dash::config::Cli;
use covid_dash::output;
use covid_dash::reports::{build_dashboard, Dashboard, Outcome};
use covid_dash::table::DataStore;
use covid_dash::util::{format_int, format_rate};
use covid_dash::{filter, ConfigError, DateSelection, Table, View};
use std::collections::HashSet;
use std::process::ExitCode;

fn print_dashboard(dash: &Dashboard, cli: &Cli) {
    println!(
        "## Global COVID-19 Metrics ({} vs {})\n",
        dash.deltas.latest_date, dash.deltas.previous_date
    );
    output::preview_table("Metric cards", None, &dash.card_rows(), 4);

    let trend_note = match dash.trend.first().map(|p| p.rolling.is_empty()) {
        Some(false) => format!("{}-day rolling average of Confirmed", cli.rolling_window),
        _ => "rolling average off".to_string(),
    };
    let trend = dash.trend_rows();
    let skip = trend.len().saturating_sub(14);
    output::preview_table("Trends", Some(&trend_note), &trend[skip..], 14);

    output::preview_table("Regional Analysis", None, &dash.region_rows(), usize::MAX);

    let note = format!("Top {} countries by {}", cli.top_n, dash.top_metric);
    output::preview_table("Top Affected Countries", Some(&note), &dash.country_rows(), usize::MAX);

    let note = format!(
        "{} markers by {}, largest 10 shown",
        format_int(dash.markers.len() as u64),
        dash.map_metric
    );
    output::preview_table("Map markers", Some(&note), &dash.marker_rows(), 10);

    let insights = &dash.insights;
    println!("### Key Insights\n");
    println!("- Mortality Rate: {}", format_rate(insights.rates.mortality));
    println!("- Recovery Rate: {}", format_rate(insights.rates.recovery));
    println!(
        "- Most Affected Region: {}",
        insights.most_affected_region.as_deref().unwrap_or("-")
    );
    println!(
        "- Most Affected Country: {}\n",
        insights.most_affected_country.as_deref().unwrap_or("-")
    );
}

/// Returns `false` if any requested write failed.
fn write_exports(cli: &Cli, view: &View<'_>, dash: Option<&Dashboard>) -> bool {
    let mut ok = true;
    if let Some(path) = &cli.export {
        match output::export_view(path, view) {
            Ok(()) => log::info!("filtered data exported to {}", path.display()),
            Err(e) => {
                log::error!("write error for {}: {}", path.display(), e);
                ok = false;
            }
        }
    }
    if let (Some(path), Some(dash)) = (&cli.summary, dash) {
        match output::write_json(path, &dash.summary()) {
            Ok(()) => log::info!("summary saved to {}", path.display()),
            Err(e) => {
                log::error!("write error for {}: {}", path.display(), e);
                ok = false;
            }
        }
    }
    ok
}

fn resolve_filters(cli: &Cli, table: &Table) -> Result<(DateSelection, HashSet<String>), ConfigError> {
    Ok((cli.selection(table)?, cli.region_set(table)?))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let store = DataStore::new(&cli.data);
    let table = match store.get() {
        Ok(t) => t,
        Err(e) => {
            log::error!("failed to load {}: {}", store.path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (selection, regions) = match resolve_filters(&cli, &table) {
        Ok(v) => v,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let view = filter(&table, &selection, &regions);
    log::debug!("{} of {} rows selected", view.len(), table.len());

    let written = match build_dashboard(&view, &cli.dashboard_options()) {
        Outcome::Ready(dash) => {
            print_dashboard(&dash, &cli);
            write_exports(&cli, &view, Some(&*dash))
        }
        Outcome::NoData => {
            println!("No data available for the selected filters.");
            write_exports(&cli, &view, None)
        }
    };
    if written {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
