use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log filter directives '{}'", value)
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "failed to install tracing subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins outright; otherwise the
/// configured level is expanded into filter directives. Targets stay on so
/// decision and audit log lines carry their `workflows::loans` origin.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&directives(&config.log_level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// A bare level ("debug") is widened with caps on the chattiest transport
/// dependencies; anything containing `=` or `,` is already a directive set
/// and passes through untouched.
fn directives(log_level: &str) -> String {
    if log_level.contains('=') || log_level.contains(',') {
        log_level.to_string()
    } else {
        format!("{log_level},hyper=warn,mio=warn")
    }
}

fn build_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::EnvFilter {
        value: directives.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_widened_with_dependency_caps() {
        assert_eq!(directives("debug"), "debug,hyper=warn,mio=warn");
        assert_eq!(directives("info"), "info,hyper=warn,mio=warn");
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            directives("info,loan_engine=debug"),
            "info,loan_engine=debug"
        );
        assert_eq!(directives("loan_engine=trace"), "loan_engine=trace");
    }

    #[test]
    fn invalid_directives_are_reported_with_the_input() {
        let err = build_filter("not a directive !!").expect_err("filter must not parse");
        match err {
            TelemetryError::EnvFilter { value, .. } => {
                assert_eq!(value, "not a directive !!");
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
