//! Diagnostic output.
//!
//! Messages go to `esp-println` when the `esp32-log` feature is enabled and
//! compile to nothing otherwise. Never call from inside an
//! [`InterruptGuard`](crate::guard::InterruptGuard).

#[cfg(feature = "esp32-log")]
macro_rules! log {
    ($($arg:tt)*) => {
        esp_println::println!($($arg)*)
    };
}

#[cfg(not(feature = "esp32-log"))]
macro_rules! log {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

pub(crate) use log;
