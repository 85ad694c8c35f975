//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging backend (console on web, env_logger natively)
//! - The wasm-bindgen session handle the browser shell drives

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger and panic hook for this target
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::warn!("Logger already installed");
    }
}

/// Install the logger for this target; `RUST_LOG` overrides `level`
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: log::Level) {
    let installed = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .try_init();
    if installed.is_err() {
        log::warn!("Logger already installed");
    }
}
