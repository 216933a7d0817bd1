//! Utility Module
//!
//! - [`FpsCounter`]: frame rate measurement
//! - [`Timer`]: wall-clock frame timing
//! - [`init_logger`]: `env_logger` setup for applications and tests

pub mod fps_counter;
pub mod time;

pub use fps_counter::FpsCounter;
pub use time::Timer;

/// Installs `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
