//! Parsing of free-form chat input into typed split requests.
//!
//! Participants are given as Discord mentions (`<@123>`, `<@!123>`) or plain ids separated
//! by spaces or commas. Split values are a comma-separated list matching the participant
//! order: share counts, percentages with up to two decimals, or amounts.

use crate::{
    core::{
        ledger::TripId,
        money::Money,
        split::{ParticipantId, SplitMode, SplitSpec},
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;

/// Extracts participant ids from mentions or plain ids.
#[must_use]
pub fn parse_participants(input: &str) -> Vec<ParticipantId> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let id = token
                .strip_prefix("<@")
                .and_then(|rest| rest.strip_suffix('>'))
                .map_or(token, |inner| inner.trim_start_matches('!'));
            ParticipantId::from(id)
        })
        .collect()
}

/// Turns an optional trip name into a scope. Blank names mean squad-wide.
#[must_use]
pub fn parse_scope(trip: Option<&str>) -> Option<TripId> {
    trip.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(TripId::from)
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [`Error::Config`] for any other format.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::Config {
        message: format!("'{input}' is not a date (expected YYYY-MM-DD)"),
    })
}

/// Builds a split spec from a mode, participants and an optional value list.
///
/// # Errors
/// Returns [`Error::Config`] when values are missing for a weighted mode, their count does
/// not match the participants, or a value cannot be parsed.
pub fn parse_split_spec(
    mode: SplitMode,
    participants: Vec<ParticipantId>,
    values: Option<&str>,
) -> Result<SplitSpec> {
    if mode == SplitMode::Evenly {
        return Ok(SplitSpec::Evenly(participants));
    }

    let raw: Vec<&str> = values
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if raw.len() != participants.len() {
        return Err(Error::Config {
            message: format!(
                "Expected {} split values for {} participants, got {}",
                participants.len(),
                participants.len(),
                raw.len()
            ),
        });
    }

    let parsed: Vec<i64> = raw
        .iter()
        .map(|value| parse_value(mode, value))
        .collect::<Result<_>>()?;
    let entries: Vec<(ParticipantId, i64)> = participants.into_iter().zip(parsed).collect();
    Ok(SplitSpec::from_raw(mode, entries))
}

fn parse_value(mode: SplitMode, value: &str) -> Result<i64> {
    match mode {
        SplitMode::ByShares => value.parse::<i64>().map_err(|_| Error::Config {
            message: format!("'{value}' is not a whole number of shares"),
        }),
        // hundredths of a percent and hundredths of a dollar share the same decimal shape
        SplitMode::ByPercentage => value
            .trim_end_matches('%')
            .parse::<Money>()
            .map(Money::cents)
            .map_err(|_| Error::Config {
                message: format!("'{value}' is not a percentage"),
            }),
        SplitMode::ByAmount => value.parse::<Money>().map(Money::cents),
        SplitMode::Evenly => Ok(1),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_participants_mentions_and_ids() {
        let parsed = parse_participants("<@123> <@!456>, alice,, bob");
        assert_eq!(
            parsed,
            vec![
                ParticipantId::from("123"),
                ParticipantId::from("456"),
                ParticipantId::from("alice"),
                ParticipantId::from("bob"),
            ]
        );
        assert!(parse_participants("   ").is_empty());
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("  "), None)]
    #[case(Some(" oslo "), Some(TripId::from("oslo")))]
    fn test_parse_scope(#[case] input: Option<&str>, #[case] expected: Option<TripId>) {
        assert_eq!(parse_scope(input), expected);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2025-02-28 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(matches!(parse_date("28/02/2025"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_parse_split_spec_modes() {
        let people = || vec![ParticipantId::from("a"), ParticipantId::from("b")];

        assert_eq!(
            parse_split_spec(SplitMode::Evenly, people(), Some("ignored")).unwrap(),
            SplitSpec::Evenly(people())
        );
        assert_eq!(
            parse_split_spec(SplitMode::ByShares, people(), Some("2, 1")).unwrap(),
            SplitSpec::ByShares(vec![(ParticipantId::from("a"), 2), (ParticipantId::from("b"), 1)])
        );
        assert_eq!(
            parse_split_spec(SplitMode::ByPercentage, people(), Some("66.67%,33.33")).unwrap(),
            SplitSpec::ByPercentage(vec![
                (ParticipantId::from("a"), 6_667),
                (ParticipantId::from("b"), 3_333),
            ])
        );
        assert_eq!(
            parse_split_spec(SplitMode::ByAmount, people(), Some("$12.50,7.5")).unwrap(),
            SplitSpec::ByAmount(vec![
                (ParticipantId::from("a"), Money::from_cents(1_250)),
                (ParticipantId::from("b"), Money::from_cents(750)),
            ])
        );
    }

    #[test]
    fn test_parse_split_spec_value_count_mismatch() {
        let people = vec![ParticipantId::from("a"), ParticipantId::from("b")];
        assert!(matches!(
            parse_split_spec(SplitMode::ByShares, people, Some("1")),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_parse_split_spec_bad_value() {
        let people = vec![ParticipantId::from("a")];
        assert!(matches!(
            parse_split_spec(SplitMode::ByShares, people, Some("1.5")),
            Err(Error::Config { .. })
        ));
    }
}
