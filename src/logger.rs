//! Terminal output.
//!
//! `log!` prints a line behind a colored `[module]` tag and `debug!` does the
//! same only under `--verbose`. The `status_*` functions drive the block
//! `kvikk watch` redraws after every re-scan.
//!
//! ```ignore
//! log!("routes"; "scanned {} entries", count);
//! debug!("bundle"; "cache hit: {}", key);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let tag = tag(module);
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{tag} {message}").ok();
    out.flush().ok();
}

fn tag(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "routes" => tag.bright_blue().bold().to_string(),
        "watch" => tag.bright_green().bold().to_string(),
        "bundle" => tag.bright_magenta().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// watch status block
// ============================================================================

/// Height of the last status block, erased before the next one is drawn.
static STATUS_LINES: Mutex<u16> = Mutex::new(0);

pub fn status_success(message: &str) {
    draw_status(Some("✓".green().to_string()), message);
}

pub fn status_unchanged(message: &str) {
    draw_status(None, &message.dimmed().to_string());
}

pub fn status_error(summary: &str, detail: &str) {
    draw_status(Some("✗".red().to_string()), &with_detail(summary, detail));
}

fn draw_status(symbol: Option<String>, message: &str) {
    let mut lines = STATUS_LINES.lock();
    let mut out = stdout().lock();

    if *lines > 0 {
        execute!(out, cursor::MoveUp(*lines), Clear(ClearType::FromCursorDown)).ok();
    }

    let clock = format!("[{}]", clock()).dimmed().to_string();
    match symbol {
        Some(symbol) => writeln!(out, "{clock} {symbol} {message}").ok(),
        None => writeln!(out, "{clock} {message}").ok(),
    };
    out.flush().ok();

    *lines = line_count(message);
}

/// UTC wall clock as `HH:MM:SS`.
fn clock() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
}

fn with_detail(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

fn line_count(message: &str) -> u16 {
    u16::try_from(message.lines().count().max(1)).unwrap_or(u16::MAX)
}
