//! Weekly opening hours and their stored encoding.
//!
//! Stored organization documents keep each day as a *string* that itself
//! contains serialized JSON:
//!
//! ```text
//! "Monday": "{\"open\":\"08:00\",\"close\":\"18:00\"}"
//! "Sunday": "{\"open\":\"closed\",\"close\":\"closed\"}"
//! ```
//!
//! [`DayHours::encode`] and [`DayHours::decode`] are the only places that
//! know about this format; everything else works with the structured enum.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use validator::ValidationError;

/// Sentinel written in both fields of a closed day.
pub const CLOSED_SENTINEL: &str = "closed";

const TIME_FORMAT: &str = "%H:%M";

/// Errors decoding a stored day.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HoursError {
    /// The day string is not the expected JSON object.
    #[error("malformed opening hours: {0}")]
    Malformed(String),
    /// A time is not `HH:MM`.
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    /// Only one of open/close carries the closed sentinel.
    #[error("a day must be closed on both open and close")]
    PartiallyClosed,
}

/// Opening hours for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayHours {
    /// Open between two times of day.
    Open { open: NaiveTime, close: NaiveTime },
    /// Closed all day.
    Closed,
}

/// The `{open, close}` pair inside the stored string.
#[derive(Serialize, Deserialize)]
struct WireHours {
    open: String,
    close: String,
}

impl DayHours {
    /// Open from `open` to `close`, given as `(hour, minute)` pairs.
    ///
    /// Returns `None` if either time is out of range.
    #[must_use]
    pub fn open_between(open: (u32, u32), close: (u32, u32)) -> Option<Self> {
        Some(Self::Open {
            open: NaiveTime::from_hms_opt(open.0, open.1, 0)?,
            close: NaiveTime::from_hms_opt(close.0, close.1, 0)?,
        })
    }

    /// Whether opening precedes closing. Closed days are always consistent.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self {
            Self::Open { open, close } => open < close,
            Self::Closed => true,
        }
    }

    /// Encode into the stored string form.
    #[must_use]
    pub fn encode(&self) -> String {
        let wire = self.to_wire();
        // Two plain string fields always serialize.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decode from the stored string form.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError`] if the string is not a serialized `{open, close}`
    /// pair of `HH:MM` times or of closed sentinels.
    pub fn decode(raw: &str) -> Result<Self, HoursError> {
        let wire: WireHours =
            serde_json::from_str(raw).map_err(|e| HoursError::Malformed(e.to_string()))?;
        Self::from_wire(&wire)
    }

    fn to_wire(self) -> WireHours {
        match self {
            Self::Open { open, close } => WireHours {
                open: open.format(TIME_FORMAT).to_string(),
                close: close.format(TIME_FORMAT).to_string(),
            },
            Self::Closed => WireHours {
                open: CLOSED_SENTINEL.to_owned(),
                close: CLOSED_SENTINEL.to_owned(),
            },
        }
    }

    fn from_wire(wire: &WireHours) -> Result<Self, HoursError> {
        let open_closed = wire.open.eq_ignore_ascii_case(CLOSED_SENTINEL);
        let close_closed = wire.close.eq_ignore_ascii_case(CLOSED_SENTINEL);
        match (open_closed, close_closed) {
            (true, true) => Ok(Self::Closed),
            (false, false) => Ok(Self::Open {
                open: parse_time(&wire.open)?,
                close: parse_time(&wire.close)?,
            }),
            _ => Err(HoursError::PartiallyClosed),
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, HoursError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| HoursError::InvalidTime(raw.to_owned()))
}

impl Serialize for DayHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for DayHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored documents use the string form; API clients may send the
        // object directly.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Incoming {
            Encoded(String),
            Structured(WireHours),
        }

        let decoded = match Incoming::deserialize(deserializer)? {
            Incoming::Encoded(raw) => Self::decode(&raw),
            Incoming::Structured(wire) => Self::from_wire(&wire),
        };
        decoded.map_err(serde::de::Error::custom)
    }
}

/// Opening hours for every day of the week.
///
/// A missing day takes its value from [`OpeningHours::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OpeningHours {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl Default for OpeningHours {
    /// Weekdays 08:00-18:00, Saturday 10:00-18:00, Sunday closed.
    fn default() -> Self {
        let weekday = DayHours::Open {
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        };
        let saturday = DayHours::Open {
            open: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        };
        Self {
            monday: weekday,
            tuesday: weekday,
            wednesday: weekday,
            thursday: weekday,
            friday: weekday,
            saturday,
            sunday: DayHours::Closed,
        }
    }
}

impl OpeningHours {
    /// Hours for a given weekday.
    #[must_use]
    pub const fn day(&self, weekday: Weekday) -> &DayHours {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// All seven days, Monday first.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, &DayHours)> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|day| (day, self.day(day)))
    }
}

/// Field validator: every open day must open before it closes.
///
/// # Errors
///
/// Returns a `ValidationError` with code `opening_hours` naming the first
/// inconsistent day.
pub fn validate_opening_hours(hours: &OpeningHours) -> Result<(), ValidationError> {
    if let Some((day, _)) = hours.days().find(|(_, h)| !h.is_consistent()) {
        let mut error = ValidationError::new("opening_hours");
        error.message = Some(format!("{day}: opening time must be before closing time").into());
        return Err(error);
    }
    Ok(())
}
