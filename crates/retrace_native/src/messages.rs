//! Native message routing: which categories go to the log file and which to
//! the console, plus the warning cap and the statistics file.

use bitflags::bitflags;

bitflags! {
    /// Message categories emitted by the native renderer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogFlags: u32 {
        const INFO      = 1 << 0;
        const WARNINGS  = 1 << 1;
        const ERRORS    = 1 << 2;
        const DEBUG     = 1 << 3;
        const STATS     = 1 << 4;
        const ASS_PARSE = 1 << 5;
        const PLUGINS   = 1 << 6;
        const PROGRESS  = 1 << 7;
        const NAN       = 1 << 8;
        const TIMESTAMP = 1 << 9;
        const BACKTRACE = 1 << 10;
        const MEMORY    = 1 << 11;
        const COLOR     = 1 << 12;
    }
}

impl LogFlags {
    /// Default set for log files.
    pub const LOG_DEFAULT: LogFlags = LogFlags::all();

    /// Default set for console output.
    pub const CONSOLE_DEFAULT: LogFlags = LogFlags::WARNINGS
        .union(LogFlags::ERRORS)
        .union(LogFlags::TIMESTAMP)
        .union(LogFlags::BACKTRACE)
        .union(LogFlags::MEMORY)
        .union(LogFlags::COLOR);

    /// Looks up a category by its option suffix (`ai:log:<name>`).
    #[must_use]
    pub fn from_option_name(name: &str) -> Option<LogFlags> {
        let flag = match name {
            "info" => LogFlags::INFO,
            "warnings" => LogFlags::WARNINGS,
            "errors" => LogFlags::ERRORS,
            "debug" => LogFlags::DEBUG,
            "stats" => LogFlags::STATS,
            "ass_parse" => LogFlags::ASS_PARSE,
            "plugins" => LogFlags::PLUGINS,
            "progress" => LogFlags::PROGRESS,
            "nan" => LogFlags::NAN,
            "timestamp" => LogFlags::TIMESTAMP,
            "backtrace" => LogFlags::BACKTRACE,
            "memory" => LogFlags::MEMORY,
            "color" => LogFlags::COLOR,
            _ => return None,
        };
        Some(flag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageSettings {
    pub log_flags: LogFlags,
    pub console_flags: LogFlags,
    pub log_file: String,
    pub max_warnings: i32,
    pub statistics_file: String,
}

impl MessageSettings {
    pub const DEFAULT_MAX_WARNINGS: i32 = 100;
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            log_flags: LogFlags::LOG_DEFAULT,
            console_flags: LogFlags::CONSOLE_DEFAULT,
            log_file: String::new(),
            max_warnings: Self::DEFAULT_MAX_WARNINGS,
            statistics_file: String::new(),
        }
    }
}
