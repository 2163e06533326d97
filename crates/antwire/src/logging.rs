use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full filter directive that overrides
/// `--log-level`, e.g. `antwire_event=trace,antwire=info`.
pub const LOG_ENV: &str = "ANTWIRE_LOG";

/// Crates whose events the default filter lets through.
const TARGETS: [&str; 4] = ["antwire", "antwire_event", "antwire_frame", "antwire_transport"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directive scoped to this workspace's crates; dependencies stay
    /// at `warn`.
    pub fn directive(self) -> String {
        let level = self.as_str();
        let mut directive = String::from("warn");
        for target in TARGETS {
            directive.push_str(&format!(",{target}={level}"));
        }
        directive
    }
}

fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the stderr subscriber. Stdout stays reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level))
        .with_ansi(false)
        .with_target(matches!(level, LogLevel::Debug | LogLevel::Trace));

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_level_to_workspace_crates() {
        assert_eq!(
            LogLevel::Debug.directive(),
            "warn,antwire=debug,antwire_event=debug,antwire_frame=debug,antwire_transport=debug"
        );
    }

    #[test]
    fn directive_parses_as_filter() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
            assert!(EnvFilter::try_new(level.directive()).is_ok());
        }
    }
}
