//! Tests for the InfluxQL-style duration type.

use alertflow::Duration;

#[test]
fn test_format_whole_units() {
    assert_eq!(Duration::hours(1).to_string(), "1h");
    assert_eq!(Duration::minutes(1).to_string(), "1m");
    assert_eq!(Duration::seconds(1).to_string(), "1s");
    assert_eq!(Duration::milliseconds(500).to_string(), "500ms");
    assert_eq!(Duration::microseconds(250).to_string(), "250us");
    assert_eq!(Duration::nanoseconds(7).to_string(), "7ns");
    assert_eq!(Duration::days(2).to_string(), "2d");
    assert_eq!(Duration::weeks(3).to_string(), "3w");
}

#[test]
fn test_format_zero() {
    assert_eq!(Duration::ZERO.to_string(), "0s");
}

#[test]
fn test_format_compound() {
    assert_eq!(Duration::seconds(90).to_string(), "1m30s");
    assert_eq!(Duration::minutes(75).to_string(), "1h15m");
    assert_eq!(
        (Duration::hours(25) + Duration::nanoseconds(1)).to_string(),
        "1d1h1ns"
    );
}

#[test]
fn test_format_negative() {
    assert_eq!((-Duration::seconds(90)).to_string(), "-1m30s");
    assert_eq!(Duration::nanoseconds(-1).to_string(), "-1ns");
}

#[test]
fn test_parse_simple() {
    assert_eq!("1h".parse::<Duration>().unwrap(), Duration::hours(1));
    assert_eq!("10s".parse::<Duration>().unwrap(), Duration::seconds(10));
    assert_eq!(
        "250ms".parse::<Duration>().unwrap(),
        Duration::milliseconds(250)
    );
    assert_eq!("0s".parse::<Duration>().unwrap(), Duration::ZERO);
}

#[test]
fn test_parse_compound() {
    assert_eq!(
        "1h30m".parse::<Duration>().unwrap(),
        Duration::minutes(90)
    );
    assert_eq!(
        "1m30s".parse::<Duration>().unwrap(),
        Duration::seconds(90)
    );
    assert_eq!(
        "1w2d3h".parse::<Duration>().unwrap(),
        Duration::weeks(1) + Duration::days(2) + Duration::hours(3)
    );
}

#[test]
fn test_parse_negative() {
    assert_eq!("-1m30s".parse::<Duration>().unwrap(), -Duration::seconds(90));
}

#[test]
fn test_parse_micro_spellings() {
    assert_eq!("5us".parse::<Duration>().unwrap(), Duration::microseconds(5));
    assert_eq!("5u".parse::<Duration>().unwrap(), Duration::microseconds(5));
    assert_eq!("5µs".parse::<Duration>().unwrap(), Duration::microseconds(5));
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("".parse::<Duration>().is_err());
    assert!("h".parse::<Duration>().is_err());
    assert!("10".parse::<Duration>().is_err());
    assert!("10x".parse::<Duration>().is_err());
    assert!("1h 30m".parse::<Duration>().is_err());
    assert!("1h30".parse::<Duration>().is_err());
}

#[test]
fn test_round_trip() {
    let samples = [
        Duration::ZERO,
        Duration::nanoseconds(1),
        Duration::microseconds(17),
        Duration::milliseconds(999),
        Duration::seconds(61),
        Duration::minutes(59),
        Duration::hours(23),
        Duration::days(6),
        Duration::weeks(52),
        Duration::seconds(90),
        Duration::nanoseconds(604_800_000_000_001),
        -Duration::hours(2) - Duration::minutes(30),
        Duration::nanoseconds(i64::MAX),
        Duration::nanoseconds(i64::MIN),
    ];
    for d in samples {
        let text = d.to_string();
        assert_eq!(text.parse::<Duration>().unwrap(), d, "through {text:?}");
    }
}

#[test]
fn test_serde_string_form() {
    let json = serde_json::to_string(&Duration::seconds(90)).unwrap();
    assert_eq!(json, "\"1m30s\"");
    let back: Duration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Duration::seconds(90));
}

#[test]
fn test_serde_accepts_legacy_nanoseconds() {
    let back: Duration = serde_json::from_str("3600000000000").unwrap();
    assert_eq!(back, Duration::hours(1));
}
