// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn manual_clock_set_and_advance() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);

    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.now_ms(), 1_250);

    clock.set(5);
    assert_eq!(clock.now_ms(), 5);
}

#[test]
fn system_clock_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn rfc3339_round_trip_keeps_millis() {
    let ms = 1_700_000_000_123;
    let text = to_rfc3339(ms);
    assert_eq!(text, "2023-11-14T22:13:20.123Z");
    assert_eq!(parse_rfc3339(&text), Some(ms));
}

#[parameterized(
    offset = { "2023-11-14T23:13:20.123+01:00", Some(1_700_000_000_123) },
    no_millis = { "2023-11-14T22:13:20Z", Some(1_700_000_000_000) },
    garbage = { "yesterday", None },
    empty = { "", None },
    before_epoch = { "1969-12-31T23:59:59Z", None },
)]
fn parse_rfc3339_cases(input: &str, expected: Option<u64>) {
    assert_eq!(parse_rfc3339(input), expected);
}
