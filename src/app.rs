//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the location (coordinates or geocoded place)
//! - runs the historical fetch + regression pipeline
//! - prints tables/charts
//! - writes optional exports

use chrono::{Datelike, Local};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, PredictArgs, RangeArgs, SearchArgs, SettingsArgs};
use crate::data::{GeocodeClient, PowerClient};
use crate::domain::{GraphType, Location, Preferences, QueryConfig, QueryRequest, VariableSet};
use crate::error::AppError;
use crate::io::{load_preferences, load_series_csv, save_preferences, settings_path_from_env};

pub mod pipeline;
pub mod session;

use pipeline::{QueryOptions, QueryReport};
use session::QuerySession;

/// Entry point for the `sky` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `sky --lat .. --lon ..` behaves like `sky predict --lat .. --lon ..`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Range(args) => handle_range(args),
        Command::Search(args) => handle_search(args),
        Command::Settings(args) => handle_settings(args),
    }
}

/// Logs go to stderr so `--json` output stays clean. Filter from `SKY_LOG`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SKY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = query_config_from_args(&args);
    let prefs = load_preferences(&config.settings_path)?;

    let (report, place) = match &config.input {
        Some(path) => {
            let input = load_series_csv(path)?;
            if !input.row_errors.is_empty() {
                tracing::warn!(count = input.row_errors.len(), "some CSV cells were unparsable and treated as missing");
            }
            (pipeline::run_offline(input.set, &prefs.thresholds)?, None)
        }
        None => {
            let (location, place) = resolve_location(
                config.latitude,
                config.longitude,
                config.place.as_deref(),
                config.first_place,
            )?;
            let request = QueryRequest {
                location,
                date: config.date,
            };
            (run_current_query(&request, &config, &prefs)?, place)
        }
    };

    if config.json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{}", crate::report::format_query_summary(&report, place.as_deref()));
        println!("{}", crate::report::format_predictions(&report, &prefs));
        println!("Series:");
        println!("{}", crate::report::format_series_table(&report.series, &prefs));
        if config.plot {
            print_charts(&report.series, &prefs, config.plot_width, config.plot_height);
        }
    }

    if let Some(path) = &config.export_series {
        crate::io::write_series_csv(path, &report.series, "year")?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &report)?;
    }
    Ok(())
}

/// Run one provider-backed query under a session token.
fn run_current_query(request: &QueryRequest, config: &QueryConfig, prefs: &Preferences) -> Result<QueryReport, AppError> {
    let source = PowerClient::from_env()?;
    let options = QueryOptions {
        current_year: config.current_year,
        max_concurrency: source.policy().max_concurrency,
        thresholds: prefs.thresholds,
    };

    let session = QuerySession::new();
    let ticket = session.issue(*request);
    let report = pipeline::run_query(&source, &ticket.request, &options)?;
    session
        .accept(&ticket, report)
        .ok_or_else(|| AppError::new(4, "Query was superseded before it completed."))
}

fn handle_range(args: RangeArgs) -> Result<(), AppError> {
    let settings_path = args.output.settings.clone().unwrap_or_else(settings_path_from_env);
    let prefs = load_preferences(&settings_path)?;
    let (location, _) = resolve_location(
        args.location.latitude,
        args.location.longitude,
        args.location.place.as_deref(),
        args.location.first,
    )?;

    let client = PowerClient::from_env()?;
    let report = pipeline::run_range(&client, location, args.start, args.end)?;

    if args.output.json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{}", crate::report::format_range_summary(&report));
        println!("{}", crate::report::format_series_table(&report.series, &prefs));
        if args.output.plot {
            print_charts(&report.series, &prefs, args.output.width, args.output.height);
        }
    }

    if let Some(path) = &args.output.export {
        crate::io::write_series_csv(path, &report.series, "date")?;
    }
    if let Some(path) = &args.output.export_json {
        crate::io::write_json(path, &report)?;
    }
    Ok(())
}

fn handle_search(args: SearchArgs) -> Result<(), AppError> {
    let query = args.query.join(" ");
    let places = GeocodeClient::from_env()?.search(&query)?;
    if args.json {
        println!("{}", to_json(&places)?);
    } else {
        print!("{}", crate::report::format_places(&places));
    }
    Ok(())
}

fn handle_settings(args: SettingsArgs) -> Result<(), AppError> {
    let path = args.settings.clone().unwrap_or_else(settings_path_from_env);
    let mut prefs = if args.reset {
        Preferences::default()
    } else {
        load_preferences(&path)?
    };

    if args.has_updates() {
        apply_settings(&mut prefs, &args);
        save_preferences(&path, &prefs)?;
    }

    if args.json {
        println!("{}", to_json(&prefs)?);
    } else {
        print!("{}", crate::report::format_preferences(&prefs));
    }
    Ok(())
}

fn apply_settings(prefs: &mut Preferences, args: &SettingsArgs) {
    if let Some(unit) = args.temperature_unit {
        prefs.units.temperature = unit;
    }
    if let Some(unit) = args.rainfall_unit {
        prefs.units.rainfall = unit;
    }
    if let Some(unit) = args.wind_unit {
        prefs.units.wind = unit;
    }
    if let Some(graph) = args.graph {
        prefs.display.graph_type = graph;
    }
    for var in &args.show {
        prefs.display_data.set(*var, true);
    }
    for var in &args.hide {
        prefs.display_data.set(*var, false);
    }

    let t = &mut prefs.thresholds;
    if let Some(v) = args.very_hot {
        t.very_hot = v;
    }
    if let Some(v) = args.very_cold {
        t.very_cold = v;
    }
    if let Some(v) = args.very_wet {
        t.very_wet = v;
    }
    if let Some(v) = args.very_windy {
        t.very_windy = v;
    }
    if let Some(v) = args.very_uncomfortable {
        t.very_uncomfortable = v;
    }
}

/// Coordinates win; otherwise geocode `place` and pick a candidate.
fn resolve_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
    place: Option<&str>,
    first: bool,
) -> Result<(Location, Option<String>), AppError> {
    if let (Some(lat), Some(lon)) = (latitude, longitude) {
        return Ok((Location::new(lat, lon)?, None));
    }
    let Some(query) = place else {
        return Err(AppError::new(2, "Provide --lat and --lon, or --place <name>."));
    };

    let places = GeocodeClient::from_env()?.search(query)?;
    let chosen = if first {
        places
            .first()
            .ok_or_else(|| AppError::new(3, format!("No places matched `{query}`.")))?
    } else {
        crate::cli::picker::prompt_for_place(&places)?
    };
    tracing::info!(place = %chosen.display_name, "resolved place");
    Ok((chosen.location()?, Some(chosen.display_name.clone())))
}

fn print_charts(set: &VariableSet, prefs: &Preferences, width: usize, height: usize) {
    let graph: GraphType = prefs.display.graph_type;
    for var in prefs.display_data.shown() {
        let Some(series) = set.get(var) else {
            continue;
        };
        let converted = crate::units::convert_series(var, series, &prefs.units);
        let chart = crate::plot::render_series_chart(
            var.display_name(),
            crate::units::unit_symbol(var, &prefs.units),
            set.labels(),
            &converted,
            graph,
            width,
            height,
        );
        println!("{chart}");
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::new(4, format!("Failed to encode JSON: {e}")))
}

pub fn query_config_from_args(args: &PredictArgs) -> QueryConfig {
    let today = Local::now().date_naive();
    QueryConfig {
        latitude: args.location.latitude,
        longitude: args.location.longitude,
        place: args.location.place.clone(),
        first_place: args.location.first,
        date: args.date.unwrap_or(today),
        current_year: args.current_year.unwrap_or_else(|| today.year()),
        input: args.input.clone(),
        settings_path: args.output.settings.clone().unwrap_or_else(settings_path_from_env),
        json: args.output.json,
        plot: args.output.plot,
        plot_width: args.output.width,
        plot_height: args.output.height,
        export_series: args.output.export.clone(),
        export_json: args.output.export_json.clone(),
    }
}

/// Rewrite argv so a bare flag list means `predict`.
///
/// Rules:
/// - `sky --lat 1 --lon 2`     -> `sky predict --lat 1 --lon 2`
/// - `sky --help/--version/-h` -> unchanged (show top-level help/version)
/// - `sky` / `sky <subcommand>` -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "predict".to_string());
    }
    argv
}
