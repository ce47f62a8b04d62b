//! Log sink for the TUI: records go to a bounded in-memory buffer rendered in the log panel.

use log::{LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

const LOG_CAPACITY: usize = 500;

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct SharedLogger {
    level: LevelFilter,
    buffer: LogBuffer,
    echo_stderr: bool,
}

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("[{}] {}", record.level(), record.args());
        if self.echo_stderr {
            eprintln!("{}", line);
        }
        push_line(&self.buffer, line);
    }

    fn flush(&self) {}
}

static LOG_BUFFER: OnceLock<LogBuffer> = OnceLock::new();
static LOGGER: OnceLock<SharedLogger> = OnceLock::new();

/// Install the shared logger once and return its buffer.
///
/// The level comes from `RUST_LOG`. Records are echoed to stderr when `echo` is set or
/// `CADENCE_LOG_STDERR=1`.
pub fn init(echo: bool) -> LogBuffer {
    let buffer = LOG_BUFFER
        .get_or_init(|| Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY))))
        .clone();

    let level = level_from(std::env::var("RUST_LOG").ok().as_deref());
    let echo_stderr = echo || echo_enabled(std::env::var("CADENCE_LOG_STDERR").ok().as_deref());

    let logger = LOGGER.get_or_init(|| SharedLogger {
        level,
        buffer: buffer.clone(),
        echo_stderr,
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }

    buffer
}

/// Whether records are echoed to stderr as well as buffered.
pub fn echoes_stderr() -> bool {
    LOGGER.get().map_or(false, |logger| logger.echo_stderr)
}

fn level_from(value: Option<&str>) -> LevelFilter {
    match value.map(|value| value.to_lowercase()).as_deref() {
        Some("off") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn echo_enabled(value: Option<&str>) -> bool {
    value.map_or(false, |value| value != "0")
}

fn push_line(buffer: &LogBuffer, line: String) {
    let Ok(mut buffer) = buffer.lock() else {
        return;
    };
    if buffer.len() >= LOG_CAPACITY {
        buffer.pop_front();
    }
    buffer.push_back(line);
}

pub fn snapshot(buffer: &LogBuffer) -> Vec<String> {
    buffer
        .lock()
        .map(|buffer| buffer.iter().cloned().collect())
        .unwrap_or_default()
}

/// Restores the original stderr when dropped.
pub struct StderrCaptureGuard {
    original_fd: RawFd,
    stderr_fd: RawFd,
    reader_handle: Option<JoinHandle<()>>,
}

impl Drop for StderrCaptureGuard {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.original_fd, self.stderr_fd);
            libc::close(self.original_fd);
        }
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Redirect the process stderr into `buffer` so native audio chatter does not tear the TUI.
pub fn capture_stderr(buffer: LogBuffer) -> Option<StderrCaptureGuard> {
    let stderr_fd = std::io::stderr().as_raw_fd();
    let mut fds = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return None;
    }
    let [read_fd, write_fd] = fds;

    let original_fd = unsafe { libc::dup(stderr_fd) };
    if original_fd < 0 {
        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
        return None;
    }

    if unsafe { libc::dup2(write_fd, stderr_fd) } < 0 {
        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
            libc::close(original_fd);
        }
        return None;
    }
    unsafe {
        libc::close(write_fd);
    }

    let handle = std::thread::spawn(move || {
        let file = unsafe { std::fs::File::from_raw_fd(read_fd) };
        let reader = BufReader::new(file);
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            let trimmed = line.trim_end();
            if !trimmed.is_empty() {
                push_line(&buffer, format!("[STDERR] {}", trimmed));
            }
        }
    });

    Some(StderrCaptureGuard {
        original_fd,
        stderr_fd,
        reader_handle: Some(handle),
    })
}
