#![cfg(test)]

use std::str::FromStr;

use semver::Version;

use crate::manifest::version::{RangeOp, VersionRange};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_basic_range_satisfaction() {
    let range = VersionRange::parse(">=1.0.0 <2.0.0").unwrap();

    assert!(range.satisfies(&v("1.0.0")));
    assert!(range.satisfies(&v("1.2.0")));
    assert!(range.satisfies(&v("1.9.9")));

    assert!(!range.satisfies(&v("0.9.9")));
    assert!(!range.satisfies(&v("2.0.0")));
    assert!(!range.satisfies(&v("2.1.0")));
}

#[test]
fn test_comma_separated_comparators() {
    let range = VersionRange::parse(">=1.0.0, <2.0.0").unwrap();
    assert_eq!(range.comparators().len(), 2);
    assert!(range.satisfies(&v("1.5.0")));
    assert!(!range.satisfies(&v("2.0.0")));
}

#[test]
fn test_empty_range_satisfied_by_anything() {
    let range = VersionRange::any();
    assert!(range.is_any());
    assert!(range.satisfies(&v("0.0.1")));
    assert!(range.satisfies(&v("99.0.0")));
    assert!(range.satisfies(&v("1.0.0-alpha")));
}

#[test]
fn test_bare_version_is_exact_match() {
    let range = VersionRange::parse("1.2.3").unwrap();
    assert_eq!(range.comparators()[0].0, RangeOp::Eq);
    assert!(range.satisfies(&v("1.2.3")));
    assert!(!range.satisfies(&v("1.2.4")));
}

#[test]
fn test_prerelease_ordering() {
    // A pre-release sorts below the untagged version, so it does not meet
    // a >= bound at that version but does meet a < bound.
    let at_least = VersionRange::parse(">=1.0.0").unwrap();
    assert!(!at_least.satisfies(&v("1.0.0-alpha")));
    assert!(at_least.satisfies(&v("1.0.0")));

    let below = VersionRange::parse("<1.0.0").unwrap();
    assert!(below.satisfies(&v("1.0.0-alpha")));
    assert!(!below.satisfies(&v("1.0.0")));
}

#[test]
fn test_contradictory_bounds_parse_but_never_match() {
    let range = VersionRange::parse(">=2.0.0 <1.0.0").unwrap();
    assert!(!range.satisfies(&v("0.5.0")));
    assert!(!range.satisfies(&v("1.5.0")));
    assert!(!range.satisfies(&v("2.5.0")));
}

#[test]
fn test_invalid_comparators_are_errors() {
    assert!(VersionRange::parse(">=").is_err());
    assert!(VersionRange::parse(">=not-a-version").is_err());
    assert!(VersionRange::parse("~1.0.0").is_err());
}

#[test]
fn test_display_and_from_str() {
    let range = VersionRange::from_str(">=1.0.0 <2.0.0").unwrap();
    assert_eq!(range.to_string(), ">=1.0.0 <2.0.0");
    assert_eq!(VersionRange::any().to_string(), "*");
}

#[test]
fn test_equality_ignores_separator_style() {
    let spaces = VersionRange::parse(">=1.0.0 <2.0.0").unwrap();
    let commas = VersionRange::parse(">=1.0.0,<2.0.0").unwrap();
    assert_eq!(spaces, commas);
}
