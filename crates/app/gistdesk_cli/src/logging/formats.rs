use flexi_logger::DeferredNow;
use log::{Level, Record};

/// Plain message for `info`, level-prefixed otherwise.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    match record.level() {
        Level::Info => write!(w, "{}", record.args()),
        Level::Debug | Level::Trace => write!(
            w,
            "{} [{}] {}",
            record.level(),
            record.module_path().unwrap_or("<unnamed>"),
            record.args()
        ),
        level => write!(w, "{}: {}", level, record.args()),
    }
}
