//! memstatd - memory statistics demo daemon.
//!
//! Allocates in a loop while a background probe prints memory and
//! collection-cycle statistics on a fixed interval.

use memstats::collector::CountingAlloc;
use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: CountingAlloc<Jemalloc> = CountingAlloc::new(Jemalloc);

use std::hint::black_box;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use memstats::collector::Reclaimer;
use memstats::probe::{Probe, ProbeConfig};
use memstats::storage::DEFAULT_PAUSE_CAPACITY;
use memstats::{Diff, report};

/// Pause between two iterations of the allocation loop.
const WORK_INTERVAL: Duration = Duration::from_millis(10);

/// Memory statistics demo daemon.
#[derive(Parser)]
#[command(name = "memstatd", about = "Memory statistics demo daemon", version)]
struct Args {
    /// Report interval (e.g., "5s", "500ms", "2m", or bare seconds).
    #[arg(short, long, default_value = "5s", value_parser = parse_interval)]
    interval: Duration,

    /// Number of collection-cycle pauses remembered.
    #[arg(long, default_value_t = DEFAULT_PAUSE_CAPACITY)]
    pause_capacity: usize,

    /// Force a collection cycle after every report.
    /// Disable with --force-collect=false.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    force_collect: bool,

    /// Print reports as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a human-readable interval ("500ms", "5s", "2m", "10") into a duration.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty interval string".to_string());
    }

    let (num_str, unit_ms) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1000)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60 * 1000)
    } else {
        (s, 1000)
    };

    let n = num_str
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if n == 0 {
        return Err(format!("interval '{}' must be greater than zero", s));
    }
    n.checked_mul(unit_ms)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("interval '{}' is too large", s))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["memstatd", "memstats"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Writes one report to stdout.
fn emit(diff: &Diff, json: bool) {
    if json {
        match serde_json::to_string(diff) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize report: {}", e),
        }
    } else {
        print!("{}", report::render(diff));
        println!();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("memstatd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={:?}, pause_capacity={}, force_collect={}, json={}",
        args.interval, args.pause_capacity, args.force_collect, args.json
    );

    let config = ProbeConfig::default()
        .with_interval(args.interval)
        .with_pause_capacity(args.pause_capacity);

    let reclaimer = Reclaimer::new(args.pause_capacity);
    let mut probe = match Probe::new(config, reclaimer.source()) {
        Ok(probe) => probe,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.force_collect {
        let cycles = reclaimer.clone();
        probe = probe.after_tick(move || {
            cycles.run_cycle();
        });
    }

    let json = args.json;
    let handle = match probe.spawn(move |diff| emit(diff, json)) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting allocation loop");

    let mut iterations: u64 = 0;
    while running.load(Ordering::SeqCst) {
        black_box(vec![0u8; 100]);
        iterations += 1;
        std::thread::sleep(WORK_INTERVAL);
    }

    info!("Shutting down...");
    let reports = handle.stop();
    info!(
        "Shutdown complete: {} reports, {} allocation rounds, {} collection cycles",
        reports,
        iterations,
        reclaimer.cycles()
    );

    ExitCode::SUCCESS
}
