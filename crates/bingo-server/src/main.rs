//! Standalone bingo server.
//!
//! Configured through the environment:
//!
//! | Variable                  | Default          |
//! |---------------------------|------------------|
//! | `BINGO_ADDR`              | `127.0.0.1:3000` |
//! | `BINGO_RANGE_MAX`         | `75`             |
//! | `BINGO_DRAW_INTERVAL_MS`  | `5000`           |
//! | `BINGO_IDLE_TIMEOUT_SECS` | `60`             |
//!
//! Log verbosity follows `RUST_LOG` (default `bingo=info`).

use std::str::FromStr;
use std::time::Duration;

use bingo::{BingoServer, ServerConfig};
use bingo_draw::DrawConfig;
use bingo_room::BingoConfig;

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    server: ServerConfig,
    game: BingoConfig,
}

/// Builds settings from `lookup`, falling back to defaults for unset
/// variables. A set but unparsable variable is an error.
fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings, String> {
    fn parse<T: FromStr>(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
    ) -> Result<Option<T>, String> {
        lookup(name)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| format!("{name}: cannot parse {raw:?}"))
            })
            .transpose()
    }

    let mut server = ServerConfig::default();
    let mut game = BingoConfig::default();

    if let Some(addr) = lookup("BINGO_ADDR") {
        server.bind_addr = addr;
    }
    if let Some(secs) = parse::<u64>(&lookup, "BINGO_IDLE_TIMEOUT_SECS")? {
        server.idle_timeout = Duration::from_secs(secs);
    }
    if let Some(range_max) = parse(&lookup, "BINGO_RANGE_MAX")? {
        game.range_max = range_max;
    }
    if let Some(ms) = parse::<u64>(&lookup, "BINGO_DRAW_INTERVAL_MS")? {
        game.draw = DrawConfig {
            interval: Duration::from_millis(ms),
            ..game.draw
        };
    }

    Ok(Settings { server, game })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bingo=info".into()),
        )
        .init();

    let settings = settings_from(|name| std::env::var(name).ok())?;
    tracing::info!(
        addr = %settings.server.bind_addr,
        range_max = settings.game.range_max,
        draw_interval_ms = settings.game.draw.interval.as_millis() as u64,
        "starting bingo server"
    );

    let server = BingoServer::builder()
        .bind(&settings.server.bind_addr)
        .idle_timeout(settings.server.idle_timeout)
        .config(settings.game)
        .build()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let settings = settings_from(lookup(&[])).unwrap();
        assert_eq!(settings.server, ServerConfig::default());
        assert_eq!(settings.game, BingoConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let settings = settings_from(lookup(&[
            ("BINGO_ADDR", "0.0.0.0:9000"),
            ("BINGO_RANGE_MAX", "90"),
            ("BINGO_DRAW_INTERVAL_MS", "1500"),
            ("BINGO_IDLE_TIMEOUT_SECS", " 30 "),
        ]))
        .unwrap();

        assert_eq!(settings.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.server.idle_timeout, Duration::from_secs(30));
        assert_eq!(settings.game.range_max, 90);
        assert_eq!(settings.game.draw.interval, Duration::from_millis(1500));
    }

    #[test]
    fn test_unparsable_variable_is_an_error() {
        let err = settings_from(lookup(&[("BINGO_RANGE_MAX", "lots")])).unwrap_err();
        assert!(err.contains("BINGO_RANGE_MAX"));
    }
}
