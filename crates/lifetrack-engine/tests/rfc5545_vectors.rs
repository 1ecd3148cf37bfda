//! RFC 5545 test vectors, cross-checked against the `rrule` crate.
//!
//! The oracle side feeds the raw rule text straight to `rrule`. The engine
//! side goes through parsing, canonical rendering and the window and `UNTIL`
//! bounds; the two must agree instant for instant.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use lifetrack_engine::{expand, Occurrence, Recurrence, ScheduledItem, TimeWindow};
use rrule::RRuleSet;

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
}

/// Expand `rule` from `dtstart` with the engine over a wide window.
fn engine_starts(rule: &str, dtstart: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let item = ScheduledItem::recurring(
        "vector",
        "Vector",
        dtstart,
        dtstart + Duration::minutes(30),
        Recurrence::Custom,
        rule,
    );
    let window = TimeWindow::new(dtstart - Duration::days(1), dtstart + Duration::days(5 * 366)).unwrap();
    let expansion = expand(&item, window).expect("should expand");
    assert!(expansion.warning().is_none(), "rule '{}' should parse", rule);
    expansion.map(|o: Occurrence| o.start).collect()
}

/// Expand `rule` from `dtstart` with the `rrule` crate.
fn oracle_starts(rule: &str, dtstart: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let text = format!("DTSTART:{}\nRRULE:{}", dtstart.format("%Y%m%dT%H%M%SZ"), rule);
    let set: RRuleSet = text.parse().expect("oracle should parse");
    set.all(500)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

fn dates(starts: &[DateTime<Utc>]) -> Vec<(i32, u32, u32)> {
    starts.iter().map(|s| (s.year(), s.month(), s.day())).collect()
}

fn assert_matches_oracle(rule: &str, dtstart: DateTime<Utc>) {
    let ours = engine_starts(rule, dtstart);
    let theirs = oracle_starts(rule, dtstart);
    assert!(!ours.is_empty(), "rule '{}' produced nothing", rule);
    assert_eq!(ours, theirs, "rule '{}' from {} disagrees with rrule", rule, dtstart);
}

// ===========================================================================
// Hand-checked vectors
// ===========================================================================

#[test]
fn biweekly_tue_sun_depends_on_week_start() {
    // RFC 5545 section 3.8.5.3: DTSTART 1997-08-05 (Tuesday).
    let dtstart = at(1997, 8, 5, 9, 0);

    let monday_weeks = engine_starts("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO", dtstart);
    assert_eq!(
        dates(&monday_weeks),
        vec![(1997, 8, 5), (1997, 8, 10), (1997, 8, 19), (1997, 8, 24)]
    );

    let sunday_weeks = engine_starts("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU", dtstart);
    assert_eq!(
        dates(&sunday_weeks),
        vec![(1997, 8, 5), (1997, 8, 17), (1997, 8, 19), (1997, 8, 31)]
    );
}

#[test]
fn biweekly_tue_thu_alternating_weeks() {
    let result = engine_starts("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;COUNT=8", at(2026, 1, 6, 10, 0));
    assert_eq!(
        dates(&result),
        vec![
            (2026, 1, 6),
            (2026, 1, 8),
            (2026, 1, 20),
            (2026, 1, 22),
            (2026, 2, 3),
            (2026, 2, 5),
            (2026, 2, 17),
            (2026, 2, 19),
        ]
    );
}

#[test]
fn last_friday_of_each_month() {
    let result = engine_starts("FREQ=MONTHLY;BYDAY=-1FR;COUNT=4", at(2026, 1, 30, 16, 0));
    assert_eq!(
        dates(&result),
        vec![(2026, 1, 30), (2026, 2, 27), (2026, 3, 27), (2026, 4, 24)]
    );
}

#[test]
fn first_and_last_day_of_month() {
    let result = engine_starts("FREQ=MONTHLY;BYMONTHDAY=1,-1;COUNT=5", at(2026, 1, 1, 8, 0));
    assert_eq!(
        dates(&result),
        vec![(2026, 1, 1), (2026, 1, 31), (2026, 2, 1), (2026, 2, 28), (2026, 3, 1)]
    );
}

#[test]
fn friday_the_thirteenth() {
    let result = engine_starts("FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=3", at(2026, 1, 1, 12, 0));
    assert_eq!(
        dates(&result),
        vec![(2026, 2, 13), (2026, 3, 13), (2026, 11, 13)]
    );
}

#[test]
fn last_working_day_of_each_month() {
    let result = engine_starts("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=3", at(2026, 3, 2, 9, 0));
    assert_eq!(dates(&result), vec![(2026, 3, 31), (2026, 4, 30), (2026, 5, 29)]);
}

#[test]
fn first_monday_of_each_year() {
    let result = engine_starts("FREQ=YEARLY;BYDAY=1MO;COUNT=3", at(2026, 3, 2, 9, 0));
    assert_eq!(dates(&result), vec![(2027, 1, 4), (2028, 1, 3), (2029, 1, 1)]);
}

#[test]
fn leap_day_yearly_skips_common_years() {
    let result = engine_starts("FREQ=YEARLY;COUNT=2", at(2024, 2, 29, 12, 0));
    assert_eq!(dates(&result), vec![(2024, 2, 29), (2028, 2, 29)]);
}

// ===========================================================================
// Oracle agreement
// ===========================================================================

#[test]
fn daily_rules_agree_with_rrule() {
    let dtstart = at(2026, 3, 1, 9, 0);
    assert_matches_oracle("FREQ=DAILY;COUNT=10", dtstart);
    assert_matches_oracle("FREQ=DAILY;INTERVAL=3;COUNT=8", dtstart);
    assert_matches_oracle("FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR;COUNT=10", dtstart);
    assert_matches_oracle("FREQ=DAILY;BYMONTHDAY=1,15;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=DAILY;UNTIL=20260320T090000Z", dtstart);
}

#[test]
fn weekly_rules_agree_with_rrule() {
    // 2026-03-02 is a Monday, 2026-03-04 a Wednesday.
    assert_matches_oracle("FREQ=WEEKLY;BYDAY=MO,WE;COUNT=5", at(2026, 3, 2, 9, 0));
    assert_matches_oracle("FREQ=WEEKLY;BYDAY=MO,FR;COUNT=6", at(2026, 3, 4, 9, 0));
    assert_matches_oracle("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;COUNT=8", at(2026, 3, 3, 11, 0));
    assert_matches_oracle("FREQ=WEEKLY;COUNT=6", at(2026, 3, 4, 18, 30));
    assert_matches_oracle("FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU", at(2026, 3, 3, 7, 0));
}

#[test]
fn monthly_rules_agree_with_rrule() {
    let dtstart = at(2026, 1, 15, 10, 0);
    assert_matches_oracle("FREQ=MONTHLY;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYMONTHDAY=-1;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=2TU;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=-1FR;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;INTERVAL=2;BYMONTHDAY=10,20;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;COUNT=6", at(2026, 1, 31, 10, 0));
}

#[test]
fn yearly_rules_agree_with_rrule() {
    assert_matches_oracle("FREQ=YEARLY;COUNT=3", at(2026, 3, 2, 12, 0));
    assert_matches_oracle("FREQ=YEARLY;INTERVAL=2;COUNT=2", at(2026, 6, 15, 12, 0));

    // 2026-03-02 is a Monday.
    let dtstart = at(2026, 3, 2, 9, 0);
    assert_matches_oracle("FREQ=YEARLY;BYDAY=1MO;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYMONTHDAY=1;COUNT=4", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYDAY=MO;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYDAY=-1SU;COUNT=3", dtstart);
}

#[test]
fn month_filtered_rules_agree_with_rrule() {
    let dtstart = at(2026, 3, 2, 9, 0);
    assert_matches_oracle("FREQ=YEARLY;BYMONTH=6;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYMONTH=3,6;BYDAY=-1FR;COUNT=4", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYMONTH=11;BYDAY=4TH;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYMONTH=1,7;BYMONTHDAY=15;COUNT=4", dtstart);
    assert_matches_oracle("FREQ=DAILY;BYMONTH=4;COUNT=5", dtstart);
}

#[test]
fn intersecting_weekday_and_month_day_agree_with_rrule() {
    let dtstart = at(2026, 3, 2, 9, 0);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=MO,TU;BYMONTHDAY=1,2,3;COUNT=5", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=SA;BYMONTHDAY=-7,-6,-5,-4,-3,-2,-1;COUNT=4", dtstart);
}

#[test]
fn set_position_rules_agree_with_rrule() {
    let dtstart = at(2026, 3, 2, 9, 0);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=TU,TH;BYSETPOS=2;COUNT=3", dtstart);
    assert_matches_oracle("FREQ=MONTHLY;BYDAY=SA,SU;BYSETPOS=1,-1;COUNT=6", dtstart);
    assert_matches_oracle("FREQ=YEARLY;BYMONTH=6;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=1;COUNT=2", dtstart);
    assert_matches_oracle("FREQ=WEEKLY;BYDAY=MO,WE,FR;BYSETPOS=-1;COUNT=4", dtstart);
}
