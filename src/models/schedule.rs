use chrono::{NaiveTime, Weekday};
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Weekdays in the order availability is stored, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleParseError {
    #[error("Invalid time format '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid interval: start {start} must be before end {end}")]
    EmptyInterval { start: TimeOfDay, end: TimeOfDay },

    #[error("Invalid weekday '{0}'")]
    InvalidWeekday(String),

    #[error("Invalid availability entry '{0}'")]
    InvalidAvailability(String),
}

/// Wall-clock time of day, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(u16::from(hour) * 60 + u16::from(minute)))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Adds a duration without wrapping past midnight.
    pub fn checked_add_minutes(self, minutes: u16) -> Option<Self> {
        self.0.checked_add(minutes).and_then(Self::from_minutes)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.0 / 60), u32::from(self.0 % 60), 0)
            .unwrap_or_default()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleParseError::InvalidTime(s.to_string());

        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
            return Err(invalid());
        }

        let hour = hours.parse::<u8>().map_err(|_| invalid())?;
        let minute = minutes.parse::<u8>().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A half-open span `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    #[serde(rename = "start_time")]
    start: TimeOfDay,
    #[serde(rename = "end_time")]
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawInterval {
    start_time: TimeOfDay,
    end_time: TimeOfDay,
}

impl TryFrom<RawInterval> for Interval {
    type Error = ScheduleParseError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start_time, raw.end_time)
    }
}

impl Interval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ScheduleParseError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(ScheduleParseError::EmptyInterval { start, end })
        }
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }

    /// Back-to-back intervals (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for Interval {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| ScheduleParseError::InvalidTime(s.to_string()))?;
        Interval::new(start.parse()?, end.parse()?)
    }
}

/// Working window for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub is_available: bool,
    #[serde(flatten)]
    pub window: Interval,
}

impl DayAvailability {
    fn default_window() -> Interval {
        Interval {
            start: TimeOfDay(9 * 60),
            end: TimeOfDay(18 * 60),
        }
    }

    pub fn open() -> Self {
        Self {
            is_available: true,
            window: Self::default_window(),
        }
    }

    pub fn closed() -> Self {
        Self {
            is_available: false,
            window: Self::default_window(),
        }
    }

    /// The working window, if the provider works this day at all.
    pub fn working_window(&self) -> Option<Interval> {
        self.is_available.then_some(self.window)
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn parse_weekday(name: &str) -> Result<Weekday, ScheduleParseError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| ScheduleParseError::InvalidWeekday(name.to_string()))
}

/// A provider's declared weekly schedule, indexed by weekday.
///
/// Serialized for the API as a map keyed by lowercase weekday name. The
/// persisted form is the compact `Display` encoding, e.g.
/// `monday=on@09:00-18:00;...;sunday=off@09:00-18:00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAvailability {
    days: [DayAvailability; 7],
}

impl Default for WeeklyAvailability {
    fn default() -> Self {
        let mut days = [DayAvailability::open(); 7];
        days[Weekday::Sun.num_days_from_monday() as usize] = DayAvailability::closed();
        Self { days }
    }
}

impl WeeklyAvailability {
    pub fn day(&self, weekday: Weekday) -> &DayAvailability {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, weekday: Weekday, day: DayAvailability) {
        self.days[weekday.num_days_from_monday() as usize] = day;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DayAvailability)> {
        WEEKDAYS.iter().copied().zip(self.days.iter())
    }
}

impl Serialize for WeeklyAvailability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (weekday, day) in self.iter() {
            map.serialize_entry(weekday_name(weekday), day)?;
        }
        map.end()
    }
}

impl fmt::Display for WeeklyAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (weekday, day)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            let flag = if day.is_available { "on" } else { "off" };
            write!(f, "{}={}@{}", weekday_name(weekday), flag, day.window)?;
        }
        Ok(())
    }
}

impl FromStr for WeeklyAvailability {
    type Err = ScheduleParseError;

    /// Days missing from the encoding keep their defaults.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut weekly = WeeklyAvailability::default();

        for entry in s.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = || ScheduleParseError::InvalidAvailability(entry.to_string());

            let (name, rest) = entry.split_once('=').ok_or_else(invalid)?;
            let (flag, window) = rest.split_once('@').ok_or_else(invalid)?;
            let is_available = match flag {
                "on" => true,
                "off" => false,
                _ => return Err(invalid()),
            };

            weekly.set(
                parse_weekday(name)?,
                DayAvailability {
                    is_available,
                    window: window.parse()?,
                },
            );
        }

        Ok(weekly)
    }
}
