use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DRIVE_UPLOAD_LOG";

/// Installs the stderr subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(runner_debug())));
    let ansi = std::env::var_os("GITHUB_ACTIONS").is_none();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}

fn runner_debug() -> bool {
    std::env::var("RUNNER_DEBUG").is_ok_and(|value| value.trim() == "1")
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}
