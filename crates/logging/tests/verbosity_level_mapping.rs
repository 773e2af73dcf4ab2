//! Flag combinations accepted by the command line map onto filter levels.

use logging::{LogConfig, Verbosity};
use tracing::level_filters::LevelFilter;

#[test]
fn each_flag_count_maps_to_one_level() {
    let cases = [
        (0, false, LevelFilter::WARN),
        (1, false, LevelFilter::INFO),
        (2, false, LevelFilter::DEBUG),
        (3, false, LevelFilter::TRACE),
        (0, true, LevelFilter::ERROR),
        (2, true, LevelFilter::ERROR),
    ];
    for (verbose, quiet, expected) in cases {
        assert_eq!(
            Verbosity::from_flags(verbose, quiet).level_filter(),
            expected,
            "-v x{verbose}, quiet={quiet}"
        );
    }
}

#[test]
fn directive_matches_level_filter() {
    for verbosity in [
        Verbosity::Quiet,
        Verbosity::Normal,
        Verbosity::Verbose,
        Verbosity::Debug,
        Verbosity::Trace,
    ] {
        let filter = LogConfig::new(verbosity).filter_with_override(None).unwrap();
        assert_eq!(filter.max_level_hint(), Some(verbosity.level_filter()));
    }
}
