use std::fmt::Arguments;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
}

impl LogLevel {
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    pub fn should_log_debug(&self) -> bool {
        matches!(self, LogLevel::Debug)
    }
}

/// Writes a single log line to the Workers console.
///
/// Native builds (unit tests) have no JS console, so lines go to stderr instead.
pub fn emit(line: Arguments) {
    #[cfg(target_arch = "wasm32")]
    worker::console_log!("{}", line);
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}", line);
}

pub fn emit_error(line: Arguments) {
    #[cfg(target_arch = "wasm32")]
    worker::console_error!("{}", line);
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}", line);
}

/// Log at INFO level (always displayed)
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit(format_args!("[INFO] {}", format_args!($($arg)*)))
    };
}

/// Log at DEBUG level (only when debug mode enabled)
#[macro_export]
macro_rules! log_debug {
    ($level:expr, $($arg:tt)*) => {
        if $level.should_log_debug() {
            $crate::logger::emit(format_args!("[DEBUG] {}", format_args!($($arg)*)))
        }
    };
}

/// Log errors (always displayed)
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit_error(format_args!("[ERROR] {}", format_args!($($arg)*)))
    };
}
