use std::{error::Error, str::FromStr};

use log::LevelFilter;
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct RollingLog {
    pub path: String,
    /// Must contain `{}` for the archive index; a `.gz` suffix compresses.
    pub archive_pattern: String,
}

/// Where log records go and how verbose each destination is.
#[derive(Clone, Debug, PartialEq)]
pub struct LogSettings {
    pub console_level: LevelFilter,
    pub file_level: LevelFilter,
    pub file: Option<RollingLog>,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Without `LOG_FILE_PATH` only the console is written.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let level = |key: &str, default: LevelFilter| match lookup(key) {
            Some(value) => LevelFilter::from_str(&value)
                .map_err(|_| format!("{} has unknown level '{}'", key, value)),
            None => Ok(default),
        };
        let file = match (lookup("LOG_FILE_PATH"), lookup("LOG_ARCHIVE_PATTERN")) {
            (Some(path), Some(archive_pattern)) => Some(RollingLog {
                path,
                archive_pattern,
            }),
            (Some(_), None) => return Err("LOG_ARCHIVE_PATTERN must be set".to_string()),
            (None, _) => None,
        };
        Ok(LogSettings {
            console_level: level("SIDELINE_LOG_LEVEL", LevelFilter::Info)?,
            file_level: level("SIDELINE_FILE_LOG_LEVEL", LevelFilter::Debug)?,
            file,
        })
    }

    pub fn build_config(&self) -> Result<Config, Box<dyn Error>> {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
            .build();
        let mut builder = Config::builder().appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(self.console_level)))
                .build("stderr", Box::new(stderr)),
        );
        let mut root = Root::builder().appender("stderr");

        if let Some(file) = &self.file {
            let roller = FixedWindowRoller::builder().build(&file.archive_pattern, LOG_FILE_COUNT)?;
            let policy = CompoundPolicy::new(
                Box::new(SizeTrigger::new(LOG_SIZE_LIMIT)),
                Box::new(roller),
            );
            let logfile = RollingFileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{d} {l} {t} - {m}{n}")))
                .build(&file.path, Box::new(policy))?;
            builder = builder.appender(
                Appender::builder()
                    .filter(Box::new(ThresholdFilter::new(self.file_level)))
                    .build("logfile", Box::new(logfile)),
            );
            root = root.appender("logfile");
        }

        // sqlx logs every statement at info
        let config = builder
            .logger(Logger::builder().build("sqlx", LevelFilter::Warn))
            .build(root.build(LevelFilter::Trace))?;
        Ok(config)
    }
}

pub fn init_logger() {
    let settings = LogSettings::from_env().expect("Invalid logging environment");
    let config = settings
        .build_config()
        .expect("Failed to build logger configuration");
    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}
