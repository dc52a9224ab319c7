//! Tests for utility functions and the poll series

use odds_sampler::core::{generate, ConfigError, PollSeries};
use odds_sampler::util::stamp::{format_date, format_minute_stamp, parse_date, parse_minute_stamp};

#[test]
fn test_minute_stamp_round_trip() {
    let at = parse_minute_stamp("202203041550").unwrap();
    assert_eq!(format_minute_stamp(at), "202203041550");
}

#[test]
fn test_minute_stamp_rejects_malformed_input() {
    for bad in ["", "20220304155", "2022030415500", "2022-03-04 15", "202213041550", "20220304155a"] {
        assert!(
            matches!(parse_minute_stamp(bad), Err(ConfigError::InvalidStartTime { .. })),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn test_date_parsing() {
    let date = parse_date("20220304").unwrap();
    assert_eq!(format_date(date), "20220304");
    assert!(matches!(parse_date("2022034"), Err(ConfigError::InvalidDate { .. })));
    assert!(matches!(parse_date("20220230"), Err(ConfigError::InvalidDate { .. })));
}

#[test]
fn test_series_for_reference_start() {
    let start = parse_minute_stamp("202203041550").unwrap();
    let instants = generate(start, 480, 5).unwrap();

    assert_eq!(instants.len(), 97);
    assert_eq!(format_minute_stamp(instants[0]), "202203040750");
    assert_eq!(format_minute_stamp(instants[96]), "202203041550");
    for pair in instants.windows(2) {
        assert_eq!((pair[1] - pair[0]).num_minutes(), 5);
    }
}

#[test]
fn test_series_is_idempotent() {
    let start = parse_minute_stamp("202203041000").unwrap();
    let series = PollSeries::default();
    assert_eq!(series.generate(start), series.generate(start));
    assert_eq!(generate(start, 480, 5).unwrap(), series.generate(start));
}
