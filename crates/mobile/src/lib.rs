pub mod host;
mod logging;
pub mod records;
pub mod session;

uniffi::setup_scaffolding!();

/// Install logging and a panic hook that logs through it.
/// Call this once at startup from Kotlin/Swift; sessions call it too.
#[uniffi::export]
pub fn init_panic_handler() {
    logging::setup_logging(false);
}
