use std::panic::PanicHookInfo;
use std::sync::Once;

use tracing_subscriber::filter::{FilterFn, LevelFilter};
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const CRATE_PREFIX: &str = "nearby_stops";

fn is_ours(metadata: &tracing::Metadata<'_>) -> bool {
    metadata
        .module_path()
        .unwrap_or_default()
        .starts_with(CRATE_PREFIX)
}

#[cfg(target_os = "android")]
fn install(level: LevelFilter) {
    use tracing_logcat::{LogcatMakeWriter, LogcatTag};

    let tag = LogcatTag::Fixed("NearbyStops-Rust".to_owned());
    let layer = match LogcatMakeWriter::new(tag) {
        Ok(writer) => tracing_subscriber::fmt::layer()
            .event_format(Format::default().with_level(false).without_time())
            .with_writer(writer)
            .with_ansi(false),
        Err(error) => {
            eprintln!("failed to initialise logcat writer: {error}");
            return;
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(FilterFn::new(is_ours))
        .with(level)
        .init();
}

#[cfg(not(target_os = "android"))]
fn install(level: LevelFilter) {
    let layer = tracing_subscriber::fmt::layer()
        .event_format(Format::default().with_level(true))
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(FilterFn::new(is_ours))
        .with(level)
        .init();
}

fn panic_hook(info: &PanicHookInfo) {
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("{info}\n{backtrace}");
}

pub(crate) fn setup_logging(verbose: bool) {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        install(if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        });
        std::panic::set_hook(Box::new(panic_hook));
    })
}
