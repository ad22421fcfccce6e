//! Korean date parsing.
//!
//! Article pages print dates as `2024년 3월 5일 14시 30분`, `2024.03.05. 14:30`,
//! `2024-03-05 14:30:15` or a bare `20240305`. All of them are wall-clock times
//! in Korea, so they are read at a fixed +09:00 offset and returned in UTC.
//! Anything unrecognized yields `None`; a missing date is never an error.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

const KST_OFFSET_SECS: i32 = 9 * 3600;

static SEPARATOR_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([.:\-/])\s*").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})\.?(?:[ T]?(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?)?").unwrap()
});

/// Rewrites unit glyphs to separators and squeezes the spacing around them.
fn normalize(text: &str) -> String {
    let replaced: String = text
        .chars()
        .filter_map(|c| match c {
            '년' | '월' => Some('.'),
            '일' => Some(' '),
            '시' | '분' | '：' => Some(':'),
            '초' => None,
            other => Some(other),
        })
        .collect();

    let squeezed = SEPARATOR_SPACING.replace_all(&replaced, "$1");
    WHITESPACE.replace_all(&squeezed, " ").trim().to_string()
}

fn kst_to_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(KST_OFFSET_SECS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

fn field(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).map_or(Some(0), |m| m.as_str().parse().ok())
}

/// Parses a Korean or numeric date string as Korean local time.
///
/// Tried in order: `yyyy[.-/]mm[.-/]dd[ T]hh:mm[:ss]` with missing time
/// fields defaulting to zero, then an eight digit `yyyyMMdd` run at midnight.
/// Impossible dates (February 30th, hour 25) are rejected.
pub fn parse_korean_date(text: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    if let Some(caps) = DATE_TIME.captures(&normalized) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return kst_to_utc(year, month, day, field(&caps, 4)?, field(&caps, 5)?, field(&caps, 6)?);
    }

    let digits: String = normalized.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 8 {
        return None;
    }

    let year = digits[0..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    kst_to_utc(year, month, day, 0, 0, 0)
}

/// Parses a published-date candidate from metadata or page text.
///
/// Values carrying their own offset (RFC 3339 from JSON-LD and meta tags,
/// RFC 2822 from feeds) are honoured as-is; everything else goes through
/// [`parse_korean_date`].
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_korean_date(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kst(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(KST_OFFSET_SECS)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, mi, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_korean_units() {
        let parsed = parse_korean_date("2024년 3월 5일 14시 30분").unwrap();
        assert_eq!(parsed, kst(2024, 3, 5, 14, 30, 0));
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T05:30:00+00:00");
    }

    #[test]
    fn test_compact_digits_at_midnight() {
        assert_eq!(parse_korean_date("20240305"), Some(kst(2024, 3, 5, 0, 0, 0)));
        assert_eq!(
            parse_korean_date("20240305").unwrap().to_rfc3339(),
            "2024-03-04T15:00:00+00:00"
        );
    }

    #[rstest]
    #[case("2024.03.05. 14:30", kst(2024, 3, 5, 14, 30, 0))]
    #[case("2024-03-05 14:30:15", kst(2024, 3, 5, 14, 30, 15))]
    #[case("2024/3/5", kst(2024, 3, 5, 0, 0, 0))]
    #[case("2024-03-05T09:05", kst(2024, 3, 5, 9, 5, 0))]
    #[case("입력 2024.03.05 14:30 | 수정 2024.03.06 10:00", kst(2024, 3, 5, 14, 30, 0))]
    #[case("입력 ： 2024. 3. 5. 오전", kst(2024, 3, 5, 0, 0, 0))]
    #[case("2024년 12월 31일 23시 59분 59초", kst(2024, 12, 31, 23, 59, 59))]
    fn test_formats(#[case] input: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_korean_date(input), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("어제 오후")]
    #[case("2024.02.30")]
    #[case("2024-03-05 25:00")]
    #[case("123456")]
    #[case("20241399")]
    fn test_absent(#[case] input: &str) {
        assert_eq!(parse_korean_date(input), None);
    }

    #[test]
    fn test_published_honours_explicit_offsets() {
        assert_eq!(parse_published("2024-03-05T05:30:00Z"), Some(kst(2024, 3, 5, 14, 30, 0)));
        assert_eq!(parse_published("2024-03-05T14:30:00+09:00"), Some(kst(2024, 3, 5, 14, 30, 0)));
        assert_eq!(
            parse_published("Tue, 05 Mar 2024 05:30:00 GMT"),
            Some(kst(2024, 3, 5, 14, 30, 0))
        );
    }

    #[test]
    fn test_published_falls_back_to_korean() {
        assert_eq!(parse_published(" 2024.03.05 14:30 "), Some(kst(2024, 3, 5, 14, 30, 0)));
        assert_eq!(parse_published(""), None);
    }
}
