//! Tracing setup.
//!
//! - LOG_LEVEL: `EnvFilter` directives; unset or invalid falls back to
//!   `DEFAULT_DIRECTIVES`.
//! - LOG_FORMAT: "json", "compact" or "pretty" (default).
//!
//! Targets in use: "tweetrater" (startup, predictions), "challenge" (sessions,
//! sampling, scoring). Per-request spans come from tower-http's TraceLayer.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,challenge=debug,tweetrater=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each arm yields a different subscriber type, so init inside the match.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}
