//! Schedule tokens and validation.
//!
//! A schedule names the weekdays it runs on (`Mon`..`Sun`) and the local
//! times it fires at (`HH:MM`), plus the `now` sentinel for a one-off run at
//! registration time.
//!
//! A schedule runs in one of two modes. `asset` mode asks the webhook about a
//! single ticker. `calendar` mode asks about the economic calendar, restricted
//! to a set of event impact levels that travel with every webhook call.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde_json::Value;

use db::ScheduleRow;
use webhook::AssetRequest;

use crate::EngineError;

/// The sentinel time token for an immediate one-off run.
pub const NOW: &str = "now";

/// Asset name calendar-mode schedules are stored and sent under.
pub const CALENDAR_ASSET: &str = "ECONOMIC_CALENDAR";

/// What a schedule asks the webhook about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleMode {
    /// News about one asset.
    #[default]
    Asset,
    /// Economic-calendar events of the chosen impact levels.
    Calendar,
}

impl ScheduleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Calendar => "calendar",
        }
    }
}

impl FromStr for ScheduleMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "calendar" => Ok(Self::Calendar),
            _ => Err(EngineError::InvalidSchedule(format!("unknown mode '{s}'"))),
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact level of an economic-calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl FromStr for Impact {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(EngineError::InvalidSchedule(format!("unknown impact '{s}'"))),
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A weekday a schedule runs on. Renders as `Mon`..`Sun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayToken(pub Weekday);

impl FromStr for DayToken {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::from_str(s.trim())
            .map(DayToken)
            .map_err(|_| EngineError::InvalidSchedule(format!("unknown day '{s}'")))
    }
}

impl fmt::Display for DayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time a schedule fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeToken {
    /// Fire once, as soon as the schedule is registered.
    Now,
    /// Fire every configured weekday at this local time.
    At(NaiveTime),
}

impl TimeToken {
    pub fn is_now(&self) -> bool {
        matches!(self, Self::Now)
    }

    /// `(hour, minute)` of a recurring token.
    pub fn hour_minute(&self) -> Option<(u32, u32)> {
        match self {
            Self::Now => None,
            Self::At(t) => Some((t.hour(), t.minute())),
        }
    }
}

impl FromStr for TimeToken {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NOW) {
            return Ok(Self::Now);
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self::At)
            .map_err(|_| EngineError::InvalidSchedule(format!("time '{s}' is not HH:MM or 'now'")))
    }
}

impl fmt::Display for TimeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => f.write_str(NOW),
            Self::At(t) => write!(f, "{}", t.format("%H:%M")),
        }
    }
}

/// A validated, normalized schedule definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    /// Uppercase ticker.
    pub asset: String,
    pub language: String,
    pub days: Vec<DayToken>,
    pub times: Vec<TimeToken>,
    pub mode: ScheduleMode,
    /// Non-empty in calendar mode, empty otherwise.
    pub impacts: Vec<Impact>,
}

impl ScheduleSpec {
    /// Validate raw request fields of an asset-mode schedule. Duplicate tokens
    /// collapse, first one wins.
    pub fn parse<D, T>(asset: &str, language: &str, days: D, times: T) -> Result<Self, EngineError>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let asset = asset.trim().to_uppercase();
        if asset.is_empty() {
            return Err(EngineError::InvalidSchedule("asset must not be empty".into()));
        }

        let days = parse_tokens::<DayToken, _>(days)?;
        if days.is_empty() {
            return Err(EngineError::InvalidSchedule("at least one day is required".into()));
        }

        let times = parse_tokens::<TimeToken, _>(times)?;
        if times.is_empty() {
            return Err(EngineError::InvalidSchedule("at least one time is required".into()));
        }

        Ok(Self {
            asset,
            language: language.trim().to_owned(),
            days,
            times,
            mode: ScheduleMode::Asset,
            impacts: Vec::new(),
        })
    }

    /// Put the schedule in `mode`.
    ///
    /// Calendar mode needs at least one impact level; asset mode ignores
    /// `impacts`.
    pub fn with_mode<I>(mut self, mode: ScheduleMode, impacts: I) -> Result<Self, EngineError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.mode = mode;
        self.impacts = match mode {
            ScheduleMode::Asset => Vec::new(),
            ScheduleMode::Calendar => {
                let impacts = parse_tokens::<Impact, _>(impacts)?;
                if impacts.is_empty() {
                    return Err(EngineError::InvalidSchedule(
                        "calendar schedules need at least one impact level".into(),
                    ));
                }
                impacts
            }
        };
        Ok(self)
    }

    /// Rebuild from a stored row.
    pub fn from_row(row: &ScheduleRow) -> Result<Self, EngineError> {
        let mode: ScheduleMode = row.mode.parse()?;
        Self::parse(&row.asset, &row.language, row.day_list(), row.time_list())?
            .with_mode(mode, row.impact_list())
    }

    /// Stored form of `days`, a JSON array.
    pub fn days_json(&self) -> String {
        to_json_list(&self.days)
    }

    /// Stored form of `times`, a JSON array.
    pub fn times_json(&self) -> String {
        to_json_list(&self.times)
    }

    /// Stored form of `impacts`, a JSON array.
    pub fn impacts_json(&self) -> String {
        to_json_list(&self.impacts)
    }

    /// The body posted to the webhook when this schedule runs.
    pub fn request(&self) -> AssetRequest {
        let request = AssetRequest::new(&self.asset, &self.language);
        match self.mode {
            ScheduleMode::Asset => request,
            ScheduleMode::Calendar => {
                request.with_impacts(self.impacts.iter().map(ToString::to_string).collect())
            }
        }
    }
}

fn parse_tokens<Tok, I>(raw: I) -> Result<Vec<Tok>, EngineError>
where
    Tok: FromStr<Err = EngineError> + PartialEq,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut tokens = Vec::new();
    for item in raw {
        let token: Tok = item.as_ref().parse()?;
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

fn to_json_list<Tok: fmt::Display>(tokens: &[Tok]) -> String {
    Value::from(tokens.iter().map(ToString::to_string).collect::<Vec<_>>()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_asset_and_tokens() {
        let spec = ScheduleSpec::parse(" btc ", "en", ["mon", "Fri", "Mon"], ["9:05", "now", "09:05"])
            .unwrap();

        assert_eq!(spec.asset, "BTC");
        assert_eq!(spec.days_json(), r#"["Mon","Fri"]"#);
        assert_eq!(spec.times_json(), r#"["09:05","now"]"#);
    }

    #[test]
    fn rejects_unknown_day() {
        let err = ScheduleSpec::parse("BTC", "en", ["Funday"], ["10:00"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchedule(_)));
    }

    #[test]
    fn rejects_bad_time() {
        for bad in ["25:00", "10:61", "noon", ""] {
            let err = ScheduleSpec::parse("BTC", "en", ["Mon"], [bad]).unwrap_err();
            assert!(matches!(err, EngineError::InvalidSchedule(_)), "{bad} accepted");
        }
    }

    #[test]
    fn rejects_empty_lists_and_asset() {
        let no_days: [&str; 0] = [];
        assert!(ScheduleSpec::parse("BTC", "en", no_days, ["now"]).is_err());
        assert!(ScheduleSpec::parse("BTC", "en", ["Mon"], no_days).is_err());
        assert!(ScheduleSpec::parse("  ", "en", ["Mon"], ["now"]).is_err());
    }

    #[test]
    fn calendar_mode_keeps_impacts_and_sends_them() {
        let spec = ScheduleSpec::parse(CALENDAR_ASSET, "en", ["Mon"], ["08:00"])
            .unwrap()
            .with_mode(ScheduleMode::Calendar, ["HIGH", "medium", "high"])
            .unwrap();

        assert_eq!(spec.impacts_json(), r#"["high","medium"]"#);
        let request = spec.request();
        assert_eq!(request.asset, CALENDAR_ASSET);
        assert_eq!(request.impacts, Some(vec!["high".to_owned(), "medium".to_owned()]));
    }

    #[test]
    fn calendar_mode_needs_a_known_impact() {
        let base = ScheduleSpec::parse(CALENDAR_ASSET, "en", ["Mon"], ["08:00"]).unwrap();
        let none: [&str; 0] = [];
        assert!(base.clone().with_mode(ScheduleMode::Calendar, none).is_err());
        assert!(base.with_mode(ScheduleMode::Calendar, ["extreme"]).is_err());
    }

    #[test]
    fn asset_mode_drops_impacts() {
        let spec = ScheduleSpec::parse("btc", "en", ["Mon"], ["now"])
            .unwrap()
            .with_mode(ScheduleMode::Asset, ["high"])
            .unwrap();

        assert!(spec.impacts.is_empty());
        assert_eq!(spec.impacts_json(), "[]");
        assert_eq!(spec.request(), AssetRequest::new("BTC", "en"));
    }

    #[test]
    fn mode_names() {
        assert_eq!("Calendar".parse::<ScheduleMode>().unwrap(), ScheduleMode::Calendar);
        assert_eq!(ScheduleMode::default().to_string(), "asset");
        assert!("weekly".parse::<ScheduleMode>().is_err());
    }

    #[test]
    fn time_token_parts() {
        let t: TimeToken = "18:30".parse().unwrap();
        assert_eq!(t.hour_minute(), Some((18, 30)));
        assert!(!t.is_now());
        assert!("NOW".parse::<TimeToken>().unwrap().is_now());
        assert_eq!(TimeToken::Now.hour_minute(), None);
    }
}
