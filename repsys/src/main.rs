mod demo;

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use repsys_core::config::Config;
use repsys_core::Runtime;
use repsys_engine::NullEngine;
use repsys_types::Snapshot;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("repsys")
        .join("repsys.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path).unwrap_or_else(|_| {
        File::create(std::env::temp_dir().join("repsys.log")).expect("Cannot create log file")
    });

    WriteLogger::init(log_level, simplelog::Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("repsys starting (log level: {:?})", log_level);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::load();
    let verbose = config.verbose() || args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let seconds: u64 = args
        .iter()
        .position(|a| a == "--seconds")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    if let Err(e) = run(&config, Duration::from_secs(seconds)) {
        log::error!("{}", e);
        eprintln!("repsys: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, length: Duration) -> Result<(), repsys_core::ReconcileError> {
    let engine = Arc::new(NullEngine::new());
    let mut runtime = Runtime::new(engine, config, Snapshot::new())?;

    let script = demo::spawn(runtime.handle(), length);
    let result = runtime.run();
    if script.join().is_err() {
        log::error!("demo script panicked");
    }
    result?;

    let state = runtime.state();
    println!(
        "session ended: {} track(s), transport at sample {:.0}",
        state.current_track_ids().len(),
        state.timing.time
    );
    Ok(())
}
