use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Stdout carries the result protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    std::process::exit(sc_cli::run_cli_from_args(std::env::args_os()));
}
