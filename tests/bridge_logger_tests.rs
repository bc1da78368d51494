//! Backend logger tests: setup failures, routing, file output
#![cfg(not(feature = "disable-logging"))]

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use rt_log_bridge::realtime::{always_realtime, never_realtime};
use rt_log_bridge::sink::rotated_path;
use rt_log_bridge::{BridgeLogger, LogFormat, LoggerConfig, SinkOptions, ThreadRtFlag};
use serde_json::Value;
use tempfile::TempDir;

fn read(logger: &BridgeLogger) -> String {
    fs::read_to_string(logger.log_file_path()).unwrap()
}

#[test]
fn test_duplicate_name_fails_to_start() {
    let dir = TempDir::new().unwrap();

    let mut first = BridgeLogger::new("info", LogFormat::Text);
    first
        .initialize(SinkOptions::new(dir.path().join("a.txt"), "log_1"))
        .unwrap();

    let mut second = BridgeLogger::new("info", LogFormat::Text);
    let error = second
        .initialize(SinkOptions::new(dir.path().join("b.txt"), "log_1"))
        .unwrap_err();
    assert_eq!(error.code(), "FAILED_TO_START_LOGGER");
    assert!(!second.is_initialized());
}

#[test]
fn test_duplicate_name_replaced_on_request() {
    let dir = TempDir::new().unwrap();

    let mut first = BridgeLogger::new("info", LogFormat::Text);
    first
        .initialize(SinkOptions::new(dir.path().join("a.txt"), "log_2"))
        .unwrap();

    let mut second = BridgeLogger::new("info", LogFormat::Text);
    second
        .initialize(SinkOptions::new(dir.path().join("b.txt"), "log_2").with_drop_if_duplicate(true))
        .unwrap();
    assert!(second.is_initialized());

    // The replaced logger going away must not free the name
    drop(first);
    let mut third = BridgeLogger::new("info", LogFormat::Text);
    assert!(third
        .initialize(SinkOptions::new(dir.path().join("c.txt"), "log_2"))
        .is_err());
}

#[test]
fn test_invalid_level_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("debbbug", LogFormat::Text);

    let error = logger
        .initialize(SinkOptions::new(dir.path().join("log.txt"), "log_invalid"))
        .unwrap_err();
    assert_eq!(error.code(), "INVALID_LOG_LEVEL");
    assert_eq!(error.to_string(), "Invalid log level 'debbbug'");
}

#[test]
fn test_unopenable_path_fails_to_start() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("info", LogFormat::Text);

    // A directory cannot be opened as the log file
    let error = logger
        .initialize(SinkOptions::new(dir.path(), "log_dir"))
        .unwrap_err();
    assert_eq!(error.code(), "FAILED_TO_START_LOGGER");
}

#[test]
fn test_level_filtering_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("warning", LogFormat::Text).with_realtime_probe(never_realtime);
    logger
        .initialize(SinkOptions::new(dir.path().join("log.txt"), "log_filter"))
        .unwrap();

    logger.debug(format_args!("debug line"));
    logger.info(format_args!("info line"));
    logger.warning(format_args!("warning line"));
    logger.critical(format_args!("critical line"));
    logger.close_log();

    let content = read(&logger);
    assert!(!content.contains("Started logger"));
    assert!(!content.contains("debug line"));
    assert!(!content.contains("info line"));
    assert!(content.contains("[warning] warning line"));
    assert!(content.contains("[critical] critical line"));
}

#[test]
fn test_set_log_level_applies_to_file() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("error", LogFormat::Text).with_realtime_probe(never_realtime);
    logger
        .initialize(SinkOptions::new(dir.path().join("log.txt"), "log_relevel"))
        .unwrap();

    logger.info(format_args!("before"));
    logger.set_log_level("debug").unwrap();
    logger.debug(format_args!("after"));
    logger.close_log();

    let content = read(&logger);
    assert!(!content.contains("before"));
    assert!(content.contains("[debug] after"));
}

#[test]
fn test_rt_thread_messages_reach_file() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("info", LogFormat::Text).with_poll_period(Duration::from_millis(5));
    logger
        .initialize(SinkOptions::new(dir.path().join("log.txt"), "log_rt"))
        .unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            let _rt = ThreadRtFlag::new();
            for i in 0..10 {
                logger.info(format_args!("rt message {}", i));
            }
        });
    });

    // Synchronous writes are buffered until a flush; an error record forces one
    let start = Instant::now();
    loop {
        logger.error(format_args!("poll"));
        if read(&logger).contains("rt message 9") {
            break;
        }
        assert!(start.elapsed() < Duration::from_secs(5), "RT messages never drained");
        thread::sleep(Duration::from_millis(10));
    }

    let content = read(&logger);
    let positions: Vec<usize> = (0..10)
        .map(|i| content.find(&format!("rt message {i}\n")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "RT messages out of order");
}

#[test]
fn test_queued_messages_flushed_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    let mut logger = BridgeLogger::new("debug", LogFormat::Text)
        .with_realtime_probe(always_realtime)
        .with_poll_period(Duration::from_secs(30));
    logger
        .initialize(SinkOptions::new(&path, "log_final_drain"))
        .unwrap();

    logger.debug(format_args!("queued {}", 1));
    logger.warning(format_args!("queued {}", 2));
    drop(logger);

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("[debug] queued 1"));
    assert!(content.contains("[warning] queued 2"));
}

#[test]
fn test_json_start_and_finish_records() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("info", LogFormat::Json).with_realtime_probe(never_realtime);
    logger
        .initialize(SinkOptions::new(dir.path().join("log.json"), "log_json"))
        .unwrap();

    logger.warning(format_args!("plain text"));
    logger.close_log();

    let content = read(&logger);
    let lines: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["data"]["status"], "Started");
    assert_eq!(lines[0]["name"], "log_json");
    assert_eq!(lines[1]["level"], "warning");
    assert_eq!(lines[1]["data"], "plain text");
    assert_eq!(lines[2]["data"]["status"], "Finished");
}

#[test]
fn test_from_config_with_rotation() {
    let dir = TempDir::new().unwrap();
    let mut config = LoggerConfig::default();
    config.sink = SinkOptions::new(dir.path().join("log.txt"), "log_rotate")
        .with_max_file_size(200)
        .with_max_files(2);

    let logger = BridgeLogger::from_config(&config).unwrap();
    for i in 0..20 {
        logger.error(format_args!("rotating line number {}", i));
    }

    let path = logger.log_file_path().to_path_buf();
    assert!(read(&logger).contains("rotating line number 19"));
    assert!(rotated_path(&path, 1).exists());
    assert!(rotated_path(&path, 2).exists());
    assert!(!rotated_path(&path, 3).exists());
}

#[test]
fn test_periodic_flush_worker() {
    let dir = TempDir::new().unwrap();
    let mut logger = BridgeLogger::new("info", LogFormat::Text).with_realtime_probe(never_realtime);
    logger
        .initialize(SinkOptions::new(dir.path().join("log.txt"), "log_flush").with_flush_interval(Duration::from_secs(1)))
        .unwrap();

    logger.info(format_args!("buffered"));

    let start = Instant::now();
    while !read(&logger).contains("buffered") {
        assert!(start.elapsed() < Duration::from_secs(10), "periodic flush never ran");
        thread::sleep(Duration::from_millis(50));
    }
}
