pub fn setup_logger(level: &str) {
    let log_level = match level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    // try_init so repeated calls (tests) do not panic
    let _ = env_logger::builder()
        .filter_level(log_level)
        .format_timestamp_micros()
        .try_init();
}
