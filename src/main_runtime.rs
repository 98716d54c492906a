use box_claimer::adapters::{CooldownClient, LeaderboardClient};
use box_claimer::claim::build_claim_strategy;
use box_claimer::config::{AppConfig, LoggingConfig};
use box_claimer::error::Result;
use box_claimer::scheduler::{Scheduler, SystemClock};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Wire the production clients into a scheduler.
pub fn build_scheduler(config: &AppConfig) -> Result<Scheduler> {
    let oracle = Arc::new(CooldownClient::from_config(config)?);
    let leaderboard = Arc::new(LeaderboardClient::from_config(config)?);
    let strategy = build_claim_strategy(config)?;

    Ok(Scheduler::new(
        config.identity(),
        oracle,
        leaderboard,
        strategy,
        Arc::new(SystemClock),
    ))
}

pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},box_claimer=debug", logging.level))
    });

    // File logging only when BOX_CLAIMER_LOG_DIR is set and writable.
    //
    // `tracing_appender::rolling::daily` panics (abort in release) if it can't
    // create the initial file, so probe writability first.
    let log_dir = std::env::var("BOX_CLAIMER_LOG_DIR").ok();
    let file_layer = log_dir.as_deref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                log_dir, e
            );
            return None;
        }

        let test_path = std::path::Path::new(log_dir).join(".box_claimer_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(log_dir, "box-claimer.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Process-lifetime guard
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        }
    });

    let console_layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        eprintln!("Logging to: {}/box-claimer.log", dir);
    }
}
