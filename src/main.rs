//! rtlog-demo - logging latency from real-time threads
//!
//! Starts the global logger from `RTLOG_*` environment variables, then runs
//! a few worker threads flagged as real-time that log in a tight loop and
//! time every call. Prints min/max/avg call latency at the end.
//!
//! Crate diagnostics go to stderr, filtered by `RUST_LOG`.

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rt_log_bridge::{declare_log_module, init_logger, log_info, shutdown_logger, LoggerConfig, ThreadRtFlag};

const ITERATIONS: usize = 10_000;
const WORKERS: usize = 4;
const PAUSE: Duration = Duration::from_millis(50);

declare_log_module!("demo");

/// RT worker: log `iterations` times, pausing every 100 calls so the drain
/// thread keeps up. Returns the duration of each call.
fn logger_worker(thread_id: usize, mut iterations: usize) -> Vec<Duration> {
    let mut times = Vec::with_capacity(iterations);
    let _rt = ThreadRtFlag::new();
    let mut seed = 0x9e37_79b9_u32.wrapping_mul(thread_id as u32 + 1);

    while iterations > 0 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;

        let start = Instant::now();
        log_info!("Logging rt from thread {}, {}, {}", thread_id, seed, iterations);
        times.push(start.elapsed());

        iterations -= 1;
        if iterations % 100 == 0 {
            thread::sleep(PAUSE + Duration::from_millis(thread_id as u64));
        }
    }
    times
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("{}", env!("VERSION_STRING"));

    let mut config = LoggerConfig::from_env();
    config.sink.flush_interval_secs = 1;

    let logger = match init_logger(&config) {
        Ok(logger) => logger,
        Err(e) => {
            error!(code = e.code(), "{}", e);
            return ExitCode::FAILURE;
        }
    };

    log_info!("Starting logging");

    let workers: Vec<_> = (0..WORKERS)
        .map(|id| {
            thread::Builder::new()
                .name(format!("rt-worker-{id}"))
                .spawn(move || logger_worker(id, ITERATIONS))
        })
        .collect();

    let mut times = Vec::with_capacity(WORKERS * ITERATIONS);
    for worker in workers {
        match worker.map(|handle| handle.join()) {
            Ok(Ok(worker_times)) => times.extend(worker_times),
            Ok(Err(_)) => error!("worker thread panicked"),
            Err(e) => error!(error = %e, "could not spawn worker thread"),
        }
    }

    log_info!("Finished logging");
    let path = logger.log_file_path().to_path_buf();
    drop(logger);
    shutdown_logger();

    let (Some(min), Some(max)) = (times.iter().min(), times.iter().max()) else {
        error!("no samples recorded");
        return ExitCode::FAILURE;
    };
    let avg = times.iter().sum::<Duration>() / times.len() as u32;

    println!("{} calls, log written to {}", times.len(), path.display());
    println!("Min: {} ns, max: {} ns, avg: {} ns", min.as_nanos(), max.as_nanos(), avg.as_nanos());
    ExitCode::SUCCESS
}
