//! Logging setup using `log` + `log4rs`, console output only.
//!
//! Filtering is whitelist-based: the root level defaults to OFF so external
//! crates stay silent, this crate logs at the requested application level,
//! and third-party modules can be opted in with `<module>=<level>` entries.
//! `root=<level>` opts in everything.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{h({l})}] {m}{n}";
const APP_MODULE: &str = "registry_sync";

/// Initialize the process-wide logger. The logger is global; repeated calls
/// are ignored. Console output goes to stderr.
pub fn init_logger(filters: &str) {
    let app_level = parse_app_level(filters);
    let root_level = parse_root_override(filters).unwrap_or(LevelFilter::Off);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)))
        .logger(Logger::builder().build(APP_MODULE, app_level));

    for (module, level) in parse_module_levels(filters) {
        builder = builder.logger(Logger::builder().build(module, level));
    }

    let root = Root::builder().appender(CONSOLE_APPENDER).build(root_level);
    if let Ok(config) = builder.build(root) {
        let _ = log4rs::init_config(config);
    }
}

fn parse_app_level(filters: &str) -> LevelFilter {
    split(filters)
        .find_map(|part| if part.contains('=') { None } else { parse_level(part) })
        .unwrap_or(LevelFilter::Info)
}

fn parse_root_override(filters: &str) -> Option<LevelFilter> {
    split(filters).find_map(|part| part.strip_prefix("root=").and_then(parse_level))
}

fn parse_module_levels(filters: &str) -> Vec<(String, LevelFilter)> {
    split(filters)
        .filter_map(|part| {
            let (module, level) = part.split_once('=')?;
            if module == "root" || module.is_empty() {
                return None;
            }
            Some((module.to_string(), parse_level(level)?))
        })
        .collect()
}

fn split(filters: &str) -> impl Iterator<Item = &str> {
    filters.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
