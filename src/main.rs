//! shellgrok CLI: hand-parsed flags, signal wiring, and the load -> run -> save
//! shutdown sequence.
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use shellgrok::config::{RuntimeConfig, CMDMAX, CMDMIN, MAX_THREADS, SRCHMAX, SRCHMIN};
use shellgrok::core::engine::Engine;
use shellgrok::core::pool::spawn_workers;
use shellgrok::core::tuner::spawn_tuner;
use shellgrok::core::{obs::ObservationLog, vocab::Vocabulary};
use shellgrok::persistence::{load, save, seed};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const POLL_TICK: Duration = Duration::from_millis(250);

fn print_usage() {
    eprintln!("shellgrok {VERSION}");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    shellgrok [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -w, --workers <N>   concurrency, 1..{MAX_THREADS} (default: logical CPU count)");
    eprintln!("    -l, --length <N>    initial command length, {CMDMIN}..{CMDMAX} (default {CMDMIN})");
    eprintln!("    -s, --scope <N>     initial scope percentage, {SRCHMIN}..{SRCHMAX} (default 50)");
    eprintln!("        --vocab <PATH>  vocabulary file (default .shellgrok/vocab.txt)");
    eprintln!("        --assoc <PATH>  association file (default .shellgrok/assoc.tsv)");
    eprintln!("        --obs <PATH>    observation-log file (default .shellgrok/obs.txt)");
    eprintln!("        --runtime <SECS> per-command runtime budget, seconds (default 10)");
    eprintln!("    -h, --help          print this help message and exit");
}

fn parse_args() -> Result<RuntimeConfig, String> {
    let args: Vec<String> = env::args().collect();
    let mut config = RuntimeConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-w" | "--workers" => {
                i += 1;
                config.workers = next_arg(&args, i, "--workers")?
                    .parse::<usize>()
                    .map_err(|_| "invalid value for --workers".to_string())?
                    .clamp(1, MAX_THREADS);
            }
            "-l" | "--length" => {
                i += 1;
                config.initial_length = next_arg(&args, i, "--length")?
                    .parse::<usize>()
                    .map_err(|_| "invalid value for --length".to_string())?
                    .clamp(CMDMIN, CMDMAX);
            }
            "-s" | "--scope" => {
                i += 1;
                config.initial_scope = next_arg(&args, i, "--scope")?
                    .parse::<u32>()
                    .map_err(|_| "invalid value for --scope".to_string())?
                    .clamp(SRCHMIN, SRCHMAX);
            }
            "--vocab" => {
                i += 1;
                config.vocab_path = next_arg(&args, i, "--vocab")?.clone();
            }
            "--assoc" => {
                i += 1;
                config.assoc_path = next_arg(&args, i, "--assoc")?.clone();
            }
            "--obs" => {
                i += 1;
                config.obs_path = next_arg(&args, i, "--obs")?.clone();
            }
            "--runtime" => {
                i += 1;
                config.runtime_secs = next_arg(&args, i, "--runtime")?
                    .parse::<u64>()
                    .map_err(|_| "invalid value for --runtime".to_string())?;
            }
            unknown => {
                return Err(format!("unknown option: {unknown}"));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn next_arg<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a String, String> {
    args.get(i).ok_or_else(|| format!("missing value after {flag}"))
}

fn install_signal_handler(terminating: Arc<std::sync::atomic::AtomicBool>) {
    ctrlc::set_handler(move || {
        terminating.store(true, Ordering::SeqCst);
    })
    .expect("failed to install SIGINT/SIGTERM handler");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let config = match parse_args() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let vocab_path = PathBuf::from(&config.vocab_path);
    let assoc_path = PathBuf::from(&config.assoc_path);
    let obs_path = PathBuf::from(&config.obs_path);

    let (mut vocab, obs, report) = load(&vocab_path, &assoc_path, &obs_path);
    tracing::info!(
        words = report.vocab_words,
        assoc_entries = report.assoc_entries,
        assoc_skipped = report.assoc_skipped,
        obs_lines = report.obs_lines,
        "loaded persisted state"
    );

    if vocab.is_empty() {
        let seed_report = seed(&mut vocab, config.seed_path_override.as_deref());
        tracing::info!(
            dirs_scanned = seed_report.dirs_scanned,
            words_added = seed_report.words_added,
            "seeded vocabulary from PATH"
        );
    }

    run(vocab, obs, config, &vocab_path, &assoc_path, &obs_path);
}

fn run(
    vocab: Vocabulary,
    obs: ObservationLog,
    config: RuntimeConfig,
    vocab_path: &std::path::Path,
    assoc_path: &std::path::Path,
    obs_path: &std::path::Path,
) {
    let engine = Engine::new(vocab, obs, config);
    install_signal_handler(Arc::clone(&engine.terminating));

    tracing::info!(
        workers = engine.config.workers,
        length = engine.config.initial_length,
        scope = engine.config.initial_scope,
        "starting learning loop"
    );

    let worker_handles = spawn_workers(Arc::clone(&engine));
    let tuner_handle = spawn_tuner(Arc::clone(&engine));

    while !engine.terminating.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_TICK);
    }

    tracing::info!("termination flag observed, shutting down");

    for handle in worker_handles {
        let _ = handle.join();
    }
    let _ = tuner_handle.join();

    {
        let vocab_guard = engine.vocab.lock();
        let obs_guard = engine.obs.lock();
        match save(&vocab_guard, &obs_guard, vocab_path, assoc_path, obs_path) {
            Ok(()) => tracing::info!(
                words = vocab_guard.num_words(),
                assoc_entries = vocab_guard.assoc().len(),
                obs_lines = obs_guard.len(),
                "saved persisted state"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to save persisted state"),
        }
    }
}
