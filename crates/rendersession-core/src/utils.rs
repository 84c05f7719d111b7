//! Utility helpers — data paths, date reformatting, substrings, environment.
//!
//! Everything here is stateless and independent of any render session.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::{RenderSessionError, Result};

/// Get the rendersession data directory (e.g. `~/.rendersession/`).
pub fn get_data_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rendersession")
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// Reformat a `D.M.YYYY` date as `YYYY-MM-DD`.
///
/// Day and month may be given with or without a leading zero.
pub fn reformat_date(date: &str) -> Result<String> {
    let parts: Vec<&str> = date.trim().split('.').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(RenderSessionError::InvalidArgument(format!(
            "expected a date of the form D.M.YYYY, got '{date}'"
        )));
    };

    let parse = |part: &str, what: &str| -> Result<u32> {
        part.parse::<u32>().map_err(|_| {
            RenderSessionError::InvalidArgument(format!("invalid {what} '{part}' in date '{date}'"))
        })
    };
    let day = parse(*day, "day")?;
    let month = parse(*month, "month")?;
    let year = parse(*year, "year")?;

    let parsed = i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| {
            RenderSessionError::InvalidArgument(format!("'{date}' is not a calendar date"))
        })?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

/// Characters `start..=end` of `s`, counted from 1.
///
/// Unicode-safe: positions count characters, not bytes.
pub fn substring(s: &str, start: i64, end: i64) -> Result<String> {
    if start <= 0 || end <= 0 {
        return Err(RenderSessionError::InvalidArgument(format!(
            "substring bounds must be positive, got {start}..{end}"
        )));
    }
    if start > end {
        return Err(RenderSessionError::InvalidArgument(format!(
            "substring start {start} is after end {end}"
        )));
    }
    let len = s.chars().count();
    let end = usize::try_from(end).unwrap_or(usize::MAX);
    if end > len {
        return Err(RenderSessionError::InvalidArgument(format!(
            "substring end {end} exceeds length {len}"
        )));
    }
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    Ok(s.chars().skip(start - 1).take(end - start + 1).collect())
}

/// Value of the process environment variable `name`, if set.
pub fn environment_property(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reformat_date() {
        assert_eq!(reformat_date("20.10.2016").unwrap(), "2016-10-20");
        assert_eq!(reformat_date("2.1.2016").unwrap(), "2016-01-02");
        assert_eq!(reformat_date("02.01.2016").unwrap(), "2016-01-02");
    }

    #[test]
    fn test_reformat_date_wrong_component_count() {
        for input in ["20.10", "20.10.2016.1", "2016-10-20", ""] {
            assert!(matches!(
                reformat_date(input),
                Err(RenderSessionError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_reformat_date_non_numeric() {
        assert!(reformat_date("a.b.c").is_err());
        assert!(reformat_date("1.Jan.2016").is_err());
    }

    #[test]
    fn test_reformat_date_impossible_date() {
        assert!(reformat_date("31.2.2016").is_err());
        assert!(reformat_date("1.13.2016").is_err());
    }

    #[test]
    fn test_substring() {
        assert_eq!(substring("Hello, World!", 1, 5).unwrap(), "Hello");
        assert_eq!(substring("Hello, World!", 8, 13).unwrap(), "World!");
        assert_eq!(substring("Hello, World!", 3, 3).unwrap(), "l");
    }

    #[test]
    fn test_substring_invalid_bounds() {
        let s = "Hello, World!";
        assert!(matches!(
            substring(s, 0, 4),
            Err(RenderSessionError::InvalidArgument(_))
        ));
        assert!(matches!(
            substring(s, 5, 1),
            Err(RenderSessionError::InvalidArgument(_))
        ));
        assert!(substring(s, -1, 4).is_err());
        assert!(substring(s, 1, 14).is_err());
    }

    #[test]
    fn test_substring_unicode() {
        assert_eq!(substring("Grüße aus Graz", 1, 5).unwrap(), "Grüße");
    }

    #[test]
    fn test_environment_property() {
        std::env::set_var("RENDERSESSION_TEST_PROPERTY", "on");
        assert_eq!(
            environment_property("RENDERSESSION_TEST_PROPERTY").as_deref(),
            Some("on")
        );
        std::env::remove_var("RENDERSESSION_TEST_PROPERTY");
        assert_eq!(environment_property("RENDERSESSION_TEST_PROPERTY"), None);
    }

    #[test]
    fn test_data_path_ends_with_rendersession() {
        assert!(get_data_path().ends_with(".rendersession"));
    }
}
