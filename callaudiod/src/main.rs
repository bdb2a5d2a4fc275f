//! Runs the audio routing core against a live server. Does not stand up any
//! control surface (D-Bus or otherwise) to drive [`callaudiod::facade`] — that
//! is explicitly out of scope (see the crate's module docs) — so this binary
//! exists mainly as a runnable smoke-test harness for the library.

use clap::Parser;

/// Audio routing daemon that drives PulseAudio port and profile selection
/// during calls.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enables debug-level logging.
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::info!("callaudiod: starting, no control surface attached (see crate docs)");
    futures::executor::block_on(callaudiod::session::Session::run());
}
