use log::LevelFilter;
use num_format::Locale;

/// Number format for log output, e.g. `1,234,567`
pub const NUMBER_FORMAT: Locale = Locale::en;

pub fn init_logging(level: LevelFilter) {
    env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(level)
        .init()
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .try_init();
}
