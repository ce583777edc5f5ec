use std::time::Duration;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use sysmoni::commands;
use sysmoni::config::{parse_duration, Config, SortKey};

fn main() -> Result<()> {
    sysmoni::init_logging();

    let matches = Command::new("sysmoni")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Host resource telemetry sampler")
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("DURATION")
                .help("Refresh interval (e.g. 500ms, 2s, or bare seconds)")
                .default_value("1s")
                .value_parser(|s: &str| parse_duration(s).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .help("Sort column for the process list")
                .value_parser(value_parser!(SortKey))
                .default_value("cpu"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("REGEX")
                .help("Only show processes whose command matches"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON sample and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json-stream")
                .long("json-stream")
                .help("Stream NDJSON samples until interrupted")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-gpu")
                .long("no-gpu")
                .help("Disable GPU sampling")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-battery")
                .long("no-battery")
                .help("Disable battery sampling")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("kills")
                .about("List recent OOM-killer actions from the earlyoom journal")
                .arg(
                    Arg::new("lines")
                        .short('n')
                        .long("lines")
                        .help("Journal lines to scan")
                        .value_parser(value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print events as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("sysmoni-worker")
        .build()
        .context("Failed to start async runtime")?;

    match matches.subcommand() {
        Some(("kills", sub_matches)) => runtime.block_on(commands::kills::execute(sub_matches)),
        _ => {
            let config = config_from_matches(&matches)?;
            runtime.block_on(commands::monitor::execute(config))
        }
    }
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config {
        interval: matches
            .get_one::<Duration>("interval")
            .copied()
            .unwrap_or(Config::default().interval),
        sort: matches.get_one::<SortKey>("sort").copied().unwrap_or_default(),
        filter: matches.get_one::<String>("filter").cloned(),
        json: matches.get_flag("json"),
        json_stream: matches.get_flag("json-stream"),
        enable_gpu: !matches.get_flag("no-gpu"),
        enable_battery: !matches.get_flag("no-battery"),
    };
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
