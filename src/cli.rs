//! Command-line interface for the audit-log pipeline.
//!
//! One subcommand per stage (`fetch`, `enrich`, `export`, `check`, `submit`)
//! plus `run`, which chains them and stops short of ingestion unless
//! `--submit` is passed.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::{ApiClient, UsageLogQuery};
use crate::config::Config;
use crate::dates;
use crate::enrich::{ComponentPattern, EventTagTable, EventTypeTable};
use crate::export;
use crate::guard;
use crate::models::AuditRecord;
use crate::store::ArtifactStore;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn date_range_args() -> Vec<Arg> {
    vec![
        Arg::new("start")
            .short('s')
            .long("start")
            .help("First day of the range (YYYY-MM-DD)")
            .required(true)
            .action(ArgAction::Set),
        Arg::new("end")
            .short('e')
            .long("end")
            .help("Last day of the range, inclusive (YYYY-MM-DD)")
            .required(true)
            .action(ArgAction::Set),
    ]
}

fn filter_args() -> Vec<Arg> {
    vec![
        Arg::new("login")
            .long("login")
            .help("Only fetch events for this login")
            .action(ArgAction::Set),
        Arg::new("ip")
            .long("ip")
            .help("Only fetch events from this source IP")
            .action(ArgAction::Set),
        Arg::new("filter_rsid")
            .long("filter-rsid")
            .help("Only fetch events touching this report suite")
            .action(ArgAction::Set),
        Arg::new("event_type")
            .long("event-type")
            .help("Only fetch events with this numeric event-type code")
            .action(ArgAction::Set),
        Arg::new("event")
            .long("event")
            .help("Only fetch events whose description contains this keyword")
            .action(ArgAction::Set),
        Arg::new("limit")
            .long("limit")
            .help("Rows per page")
            .value_parser(clap::value_parser!(u32))
            .action(ArgAction::Set),
    ]
}

fn rsid_arg() -> Arg {
    Arg::new("rsid")
        .short('r')
        .long("rsid")
        .help("Destination report suite id for the export")
        .required(true)
        .action(ArgAction::Set)
}

fn build_command() -> Command {
    Command::new("usagebridge")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the JSON config file (defaults to the user config directory)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .help("Working directory for pipeline artifacts")
                .default_value(".")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("fetch")
                .about("Download audit logs for a date range into the working directory")
                .args(date_range_args())
                .args(filter_args()),
        )
        .subcommand(
            Command::new("enrich")
                .about("Decode event types, extract component info, and tag events"),
        )
        .subcommand(
            Command::new("export")
                .about("Write the enriched records as a bulk-import CSV")
                .arg(rsid_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Validate the export and check the report suite for existing data"),
        )
        .subcommand(
            Command::new("submit")
                .about("Run both safety checks, then perform the bulk data insertion"),
        )
        .subcommand(
            Command::new("run")
                .about("Fetch, enrich, export, and check in one go")
                .after_help(
                    "Stops after the safety checks unless --submit is passed.\nExample:\n  usagebridge run -s 2022-02-01 -e 2022-02-28 -r myrsid",
                )
                .args(date_range_args())
                .args(filter_args())
                .arg(rsid_arg())
                .arg(
                    Arg::new("submit")
                        .long("submit")
                        .help("Perform the bulk data insertion after the checks pass")
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<()> {
    let mut cmd_for_help = build_command();
    let matches = build_command().get_matches();

    match matches.subcommand() {
        Some(("fetch", sub)) => cmd_fetch(sub).await,
        Some(("enrich", sub)) => cmd_enrich(sub),
        Some(("export", sub)) => cmd_export(sub),
        Some(("check", sub)) => cmd_check(sub).await,
        Some(("submit", sub)) => cmd_submit(sub).await,
        Some(("run", sub)) => cmd_run(sub).await,
        _ => {
            cmd_for_help
                .print_help()
                .context("Failed to print help")?;
            Ok(())
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    Config::load(&path)
}

fn open_store(matches: &ArgMatches) -> Result<ArtifactStore> {
    let dir = matches
        .get_one::<PathBuf>("dir")
        .expect("dir has a default value");
    ArtifactStore::new(dir.clone())
}

fn query_from_matches(matches: &ArgMatches) -> Result<UsageLogQuery> {
    let start = dates::parse_date(matches.get_one::<String>("start").expect("start is required"))?;
    let end = dates::parse_date(matches.get_one::<String>("end").expect("end is required"))?;

    let mut query = UsageLogQuery::new(start, end);
    query.login = matches.get_one::<String>("login").cloned();
    query.ip = matches.get_one::<String>("ip").cloned();
    query.rsid = matches.get_one::<String>("filter_rsid").cloned();
    query.event_type = matches.get_one::<String>("event_type").cloned();
    query.event = matches.get_one::<String>("event").cloned();
    if let Some(&limit) = matches.get_one::<u32>("limit") {
        query.limit = limit;
    }
    Ok(query)
}

async fn cmd_fetch(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let store = open_store(matches)?;
    let query = query_from_matches(matches)?;

    let mut client = ApiClient::new(&config)?;
    client.authenticate().await?;

    let records = client.fetch_usage_logs(&query).await?;
    store.save_records(&records)?;
    info!(
        records = records.len(),
        path = %store.records_path().display(),
        "audit records saved"
    );
    Ok(())
}

fn cmd_enrich(matches: &ArgMatches) -> Result<()> {
    let store = open_store(matches)?;
    run_enrichment(&store)
}

/// The three passes, each persisted on its own so a partially enriched
/// collection is inspectable between steps.
fn run_enrichment(store: &ArtifactStore) -> Result<()> {
    let event_types = EventTypeTable::default();
    apply_pass(store, "event types", |records| event_types.apply(records))?;

    let components = ComponentPattern::new().context("Failed to compile component pattern")?;
    apply_pass(store, "component info", |records| components.apply(records))?;

    let tags = EventTagTable::default();
    apply_pass(store, "event tags", |records| tags.apply(records))?;

    Ok(())
}

fn apply_pass(
    store: &ArtifactStore,
    name: &str,
    pass: impl Fn(&mut [AuditRecord]),
) -> Result<()> {
    let mut records = store.load_records()?;
    pass(&mut records);
    store.save_records(&records)?;
    info!(pass = name, records = records.len(), "enrichment pass saved");
    Ok(())
}

fn cmd_export(matches: &ArgMatches) -> Result<()> {
    let store = open_store(matches)?;
    let rsid = matches.get_one::<String>("rsid").expect("rsid is required");

    let records = store.load_records()?;
    let rows = export::build_rows(&records, rsid)?;
    export::write_csv(&rows, &store.export_path())?;
    info!(
        rows = rows.len(),
        path = %store.export_path().display(),
        "export written"
    );
    Ok(())
}

async fn cmd_check(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let store = open_store(matches)?;

    let mut client = ApiClient::new(&config)?;
    client.authenticate().await?;

    guard::ensure_safe_to_submit(&client, &store.export_path()).await?;
    info!("export is valid and the date range is clear");
    Ok(())
}

async fn cmd_submit(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let store = open_store(matches)?;

    let mut client = ApiClient::new(&config)?;
    client.authenticate().await?;

    let response = guard::guarded_submit(&client, &store.export_path()).await?;
    info!(response = %response, "bulk data insertion accepted");
    Ok(())
}

async fn cmd_run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let store = open_store(matches)?;
    let query = query_from_matches(matches)?;
    let rsid = matches.get_one::<String>("rsid").expect("rsid is required");

    let mut client = ApiClient::new(&config)?;
    client.authenticate().await?;

    let records = client.fetch_usage_logs(&query).await?;
    store.save_records(&records)?;

    run_enrichment(&store)?;

    let records = store.load_records()?;
    let rows = export::build_rows(&records, rsid)?;
    export::write_csv(&rows, &store.export_path())?;
    info!(rows = rows.len(), "export written");

    if matches.get_flag("submit") {
        let response = guard::guarded_submit(&client, &store.export_path()).await?;
        info!(response = %response, "bulk data insertion accepted");
    } else {
        guard::ensure_safe_to_submit(&client, &store.export_path()).await?;
        info!("dry run complete; pass --submit to perform the bulk data insertion");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_requires_date_range() {
        let result = build_command().try_get_matches_from(vec!["usagebridge", "fetch"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_parses_filters() {
        let matches = build_command()
            .try_get_matches_from(vec![
                "usagebridge",
                "fetch",
                "-s",
                "2022-02-01",
                "-e",
                "2022-02-28",
                "--login",
                "jane@example.com",
                "--limit",
                "500",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("fetch").unwrap();
        let query = query_from_matches(sub).unwrap();
        assert_eq!(query.login.as_deref(), Some("jane@example.com"));
        assert_eq!(query.limit, 500);
        assert_eq!(query.start_date.to_string(), "2022-02-01");
    }

    #[test]
    fn test_export_requires_rsid() {
        let result = build_command().try_get_matches_from(vec!["usagebridge", "export"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_submit_defaults_off() {
        let matches = build_command()
            .try_get_matches_from(vec![
                "usagebridge",
                "run",
                "-s",
                "2022-02-01",
                "-e",
                "2022-02-28",
                "-r",
                "myrsid",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("run").unwrap();
        assert!(!sub.get_flag("submit"));
    }

    #[test]
    fn test_query_rejects_bad_date() {
        let matches = build_command()
            .try_get_matches_from(vec![
                "usagebridge",
                "fetch",
                "-s",
                "2022/02/01",
                "-e",
                "2022-02-28",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("fetch").unwrap();
        assert!(query_from_matches(sub).is_err());
    }
}
