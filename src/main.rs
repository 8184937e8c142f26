use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use mailog::log_source::{scan_files, LogSelection};
use mailog::report::{self, MailboxListing, Report, ReportOptions};
use mailog::{Config, LineClassifier, MailboxLister, ReportAggregator, ShellMailboxLister};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let matches = Command::new("mailog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyze mail logs: delivery outcomes, bounce reasons and DKIM failures")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .visible_alias("log")
                .help("Show detailed logs for rejected and bounced emails")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .help("Process all rotated log files, not just the current one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("domain")
                .short('d')
                .long("domain")
                .value_name("DOMAIN")
                .help("Only count recipients whose address contains DOMAIN (case-insensitive)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("bounced")
                .short('b')
                .long("Bounced")
                .visible_alias("bounced")
                .help("Show statistics of known bounce errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mlist")
                .short('m')
                .long("mlist")
                .help("Display all mailboxes on the server")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dkim")
                .long("dkim")
                .help("Show senders rejected by Gmail for missing SPF/DKIM")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(Config::default_path()),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .value_name("PATH")
                .help("Log file to read instead of the configured one")
                .conflicts_with("all")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("pattern")
                .long("pattern")
                .value_name("GLOB")
                .help("Wildcard used with --all instead of the configured one")
                .requires("all")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging on stderr")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if let Err(e) = run(&matches) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(Config::default_path());
    let config_found = Path::new(config_path).exists();
    if !config_found && matches.value_source("config") == Some(ValueSource::CommandLine) {
        anyhow::bail!("Configuration file '{config_path}' not found");
    }
    let config = if config_found {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    let log_level = if matches.get_flag("debug") {
        LevelFilter::Debug
    } else {
        config.log_level()
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if !config_found {
        log::info!("Configuration file '{config_path}' not found, using default configuration");
    }

    let selection = if matches.get_flag("all") {
        let pattern = matches
            .get_one::<String>("pattern")
            .cloned()
            .unwrap_or_else(|| config.logs.pattern.clone());
        LogSelection::Pattern(pattern)
    } else {
        let path = matches
            .get_one::<String>("file")
            .cloned()
            .unwrap_or_else(|| config.logs.path.clone());
        LogSelection::Single(PathBuf::from(path))
    };
    let paths = selection.resolve()?;
    log::debug!("Reading {} log file(s)", paths.len());

    let domain = matches.get_one::<String>("domain").map(String::as_str);
    let classifier = LineClassifier::new(domain);
    let mut stats = ReportAggregator::new();
    scan_files(&paths, &classifier, &mut stats)?;

    let mailboxes = matches.get_flag("mlist").then(|| {
        let lister = ShellMailboxLister::new(config.mailbox.command.clone());
        MailboxListing::from(lister.list_mailboxes())
    });
    let options = ReportOptions {
        verbose: matches.get_flag("verbose"),
        bounce_errors: matches.get_flag("bounced"),
        dkim: matches.get_flag("dkim"),
    };
    let filter = domain.filter(|d| !d.is_empty());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if matches.get_flag("json") {
        let report = Report::build(&stats, options, mailboxes.as_ref(), filter);
        report::write_json(&mut out, &report)?;
    } else {
        report::write_text(&mut out, &stats, options, mailboxes.as_ref(), filter)?;
    }
    out.flush()?;
    Ok(())
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}
