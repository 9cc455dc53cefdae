use time::format_description;
use tracing_subscriber::{fmt, EnvFilter, FmtSubscriber};

// Sets up tracing. Goes to stderr, filtered by TRACE env var.
// Levels are: trace, debug, info, warn, error
//
// EnvFilter has a standard syntax, but basically can be boiled down to (for example):
//
// All targets, info level:             info
// All modules under statement, debug:  ibtax::statement=debug
// Global at info, statement as debug:  info,ibtax::statement=debug
//
// More generally: target[span{field=value}]=level
// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
//
// fallback_filter applies only when TRACE is unset or empty. The CLI passes
// "ibtax=info" under --verbose, so per-section parse counts get logged.
pub fn setup_tracing(fallback_filter: Option<&str>) {
    // Define the time format. 5 digits of precision is apparently good enough.
    let time_format =
        format_description::parse("[hour]:[minute]:[second].[subsecond digits:5]")
            .expect("Time format description is invalid");

    let time_offset = crate::util::date::local_utc_offset()
        .unwrap_or(time::UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(time_offset, time_format);

    let filter = match fallback_filter {
        Some(f) if !crate::util::os::env_var_non_empty("TRACE") => EnvFilter::new(f),
        _ => EnvFilter::from_env("TRACE"),
    };

    // Create a subscriber that uses stderr for tracing.
    // Off by default
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_timer(timer) // Use custom time formatting
        .finish();

    // Set the subscriber as the default
    let _ = tracing::subscriber::set_global_default(subscriber);
}
