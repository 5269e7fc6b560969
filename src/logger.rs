/*
 * This file is part of acer4736-bl.
 *
 * Copyright (C) 2025 acer4736-bl contributors
 *
 * acer4736-bl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * acer4736-bl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with acer4736-bl. If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

use crate::constants::paths;

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Open the JSON event log. Falls back to /tmp when `path` cannot be opened.
/// Returns the path actually in use, or None if nothing could be opened.
pub fn init_logging(path: Option<&Path>) -> Option<PathBuf> {
    let wanted = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(paths::EVENT_LOG));

    let (file, used) = match open_append(&wanted) {
        Some(f) => (f, wanted),
        None => {
            let fallback = PathBuf::from(paths::EVENT_LOG_FALLBACK);
            (open_append(&fallback)?, fallback)
        }
    };

    match LOG_FILE.lock() {
        Ok(mut guard) => *guard = Some(file),
        Err(poisoned) => *poisoned.into_inner() = Some(file),
    }
    Some(used)
}

/// Close the event log. Later events are dropped.
pub fn shutdown_logging() {
    match LOG_FILE.lock() {
        Ok(mut guard) => *guard = None,
        Err(poisoned) => *poisoned.into_inner() = None,
    }
}

pub fn is_enabled() -> bool {
    match LOG_FILE.lock() {
        Ok(guard) => guard.is_some(),
        Err(poisoned) => poisoned.into_inner().is_some(),
    }
}

fn event_line(event: &str, data: Value) -> String {
    json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string()
}

/// Append one event. No-op until [`init_logging`] has been called.
pub fn log_event(event: &str, data: Value) {
    let line = event_line(event, data);
    let mut guard = match LOG_FILE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(f) = guard.as_mut() {
        let _ = writeln!(f, "{}", line);
    }
}

/// Install the tracing subscriber for human-readable diagnostics.
/// `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .try_init();
}
