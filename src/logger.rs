use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::errors::DbError;

pub const AUDIT_TARGET: &str = "bookstore::audit";
pub const METRICS_TARGET: &str = "bookstore::metrics";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const KEEP: u32 = 7;

/// Initializes logging from `log4rs.yaml` in the working directory. Returns `false`
/// when there is no such file and nothing was installed.
///
/// # Errors
/// Fails if the file is malformed or a logger is already installed.
pub fn init() -> Result<bool, Box<dyn std::error::Error>> {
    let path = Path::new("log4rs.yaml");
    if !path.exists() {
        return Ok(false);
    }
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(true)
}

/// Maps `error|warn|info|debug|trace|off` (any case) to a level filter.
///
/// # Errors
/// Returns `InvalidInput` for anything else.
pub fn parse_level(s: &str) -> Result<LevelFilter, DbError> {
    s.trim().parse::<LevelFilter>().map_err(|_| DbError::InvalidInput(format!("unknown log level {s:?}")))
}

fn rolling(dir: &Path, stem: &str) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{stem}.{{}}.log")).display()), KEEP)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(dir.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Builds the file logging config: `{app}.log` for everything, with writes routed to
/// `{app}_audit.log` and bench lines to `{app}_metrics.log`. Creates `dir` if missing.
///
/// # Errors
/// Returns an error if the directory or an appender cannot be created.
pub fn app_config(dir: &Path, app: &str, level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(dir, app)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(dir, &format!("{app}_audit"))?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(dir, &format!("{app}_metrics"))?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, LevelFilter::Info))
        .logger(Logger::builder().appender("metrics").additive(false).build(METRICS_TARGET, level))
        .build(Root::builder().appender("app").build(level))?;
    Ok(config)
}

/// Installs [`app_config`] as the process logger.
///
/// # Errors
/// Fails if the config cannot be built or a logger is already installed.
pub fn init_for_app(dir: &Path, app: &str, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_config(app_config(dir, app, level)?)?;
    Ok(())
}

/// Logs to stderr only; stdout stays clean for command output.
///
/// # Errors
/// Fails if a logger is already installed.
pub fn init_console(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
