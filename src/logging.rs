//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::Config;

/// Maps a configured level name to a filter. Accepts `warning` for `warn`.
pub fn parse_level(level: &str) -> Result<LevelFilter, Box<dyn std::error::Error>> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        other => Err(format!("unknown log level '{}'", other).into()),
    }
}

/// Installs the global subscriber: text or JSON lines, to stdout or appended
/// to the configured log file.
pub fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level = parse_level(config.log_level())?;
    let json = config.log_format().eq_ignore_ascii_case("json");

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            install(Mutex::new(file), level, json, false)?;
        }
        None => install(std::io::stdout, level, json, true)?,
    }

    info!(
        "Logging initialized with level: {}, format: {}",
        config.log_level(),
        config.log_format()
    );
    Ok(())
}

fn install<W>(
    writer: W,
    level: LevelFilter,
    json: bool,
    ansi: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(ansi)
        .with_writer(writer);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("Warning").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(parse_level("loud").is_err());
    }
}
