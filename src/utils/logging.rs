use env_logger::{Builder, Target};
use log::{info, LevelFilter};

const LOG_ERROR_LEVEL_MOD: &[&str] = &[
    "reqwest::async_impl::client",
    "reqwest::connect",
    "hyper_util::client",
];

fn get_log_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        // "info" => LevelFilter::Info,
        _ => LevelFilter::Info,
    }
}

/// Initializes logging for hosts that do not bring their own logger.
/// Priority: explicit argument, `TIMESHIFT_LOG` env var, default `info`.
/// Accepts either a plain level or `module=level` pairs separated by commas.
pub fn init_logger(user_log_level: Option<&str>) {
    let env_log_level = std::env::var("TIMESHIFT_LOG").ok();

    let mut log_builder = Builder::from_default_env();
    log_builder.target(Target::Stdout);

    let log_level = user_log_level
        .map(std::string::ToString::to_string)
        .or(env_log_level)
        .unwrap_or_else(|| "info".to_string());

    let mut log_levels = vec![];
    if log_level.contains('=') {
        for pair in log_level.split(',') {
            if pair.contains('=') {
                let mut kv_iter = pair.split('=').map(str::trim);
                if let (Some(module), Some(level)) = (kv_iter.next(), kv_iter.next()) {
                    let log_level = get_log_level(level);
                    log_levels.push(format!("{module}={log_level}"));
                    log_builder.filter_module(module, log_level);
                }
            } else {
                let level = get_log_level(pair);
                log_levels.push(level.to_string());
                log_builder.filter_level(level);
            }
        }
    } else {
        log_builder.filter_level(get_log_level(&log_level));
        log_levels.push(log_level);
    }
    for module in LOG_ERROR_LEVEL_MOD {
        log_builder.filter_module(module, LevelFilter::Error);
    }
    // the embedding host may already have installed a logger
    if log_builder.try_init().is_ok() {
        info!("Log Level {}", &log_levels.join(", "));
    }
}
