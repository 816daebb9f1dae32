//! Scheduled Masses and their clock handling.
//!
//! Staff type times on a 12-hour clock with a separate AM/PM selector, so a
//! stored `HH:MM` is only meaningful together with its [`Meridiem`]. All
//! ordering and edit-cutoff checks go through [`Mass::clock`].

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type MassId = i64;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
  let trimmed = input.trim();
  NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
    .map_err(|_| Error::InvalidDate(trimmed.to_owned()))
}

// ─── Meridiem ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meridiem {
  #[serde(rename = "AM")]
  Am,
  #[serde(rename = "PM")]
  Pm,
}

impl Meridiem {
  pub fn as_str(self) -> &'static str {
    match self {
      Meridiem::Am => "AM",
      Meridiem::Pm => "PM",
    }
  }
}

impl fmt::Display for Meridiem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Meridiem {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let compact: String = s
      .chars()
      .filter(|c| !c.is_whitespace() && *c != '.')
      .collect::<String>()
      .to_ascii_uppercase();
    match compact.as_str() {
      "AM" => Ok(Meridiem::Am),
      "PM" => Ok(Meridiem::Pm),
      _ => Err(Error::InvalidPeriod(s.trim().to_owned())),
    }
  }
}

// ─── MassTime ────────────────────────────────────────────────────────────────

/// A wall-clock reading as typed by staff, normalised to `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MassTime(NaiveTime);

impl MassTime {
  /// Accepts `HHMM` (four digits) or `H:MM`/`HH:MM` on a 24-hour range.
  pub fn parse(input: &str) -> Result<Self> {
    let trimmed = input.trim();
    let colon_form = if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
      format!("{}:{}", &trimmed[..2], &trimmed[2..])
    } else {
      trimmed.to_owned()
    };
    NaiveTime::parse_from_str(&colon_form, "%H:%M")
      .map(MassTime)
      .map_err(|_| Error::InvalidTime(trimmed.to_owned()))
  }

  pub fn hour(self) -> u32 { self.0.hour() }

  pub fn minute(self) -> u32 { self.0.minute() }
}

impl fmt::Display for MassTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%H:%M"))
  }
}

// ─── Mass ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mass {
  pub id:     MassId,
  pub date:   NaiveDate,
  pub time:   MassTime,
  pub period: Meridiem,
}

impl Mass {
  /// The true 24-hour time of the Mass.
  ///
  /// 12 AM is midnight, 12 PM stays noon, other PM hours move forward by
  /// twelve. Hours above twelve were typed on a 24-hour clock already.
  pub fn clock(&self) -> NaiveTime { resolve_clock(self.time, self.period) }

  /// When the Mass starts; intentions become read-only afterwards.
  pub fn scheduled_at(&self) -> NaiveDateTime { self.date.and_time(self.clock()) }

  /// Sort key giving chronological order across dates.
  pub fn chronological_key(&self) -> (NaiveDate, NaiveTime) { (self.date, self.clock()) }

  /// `HH:MM AM` as shown on screens, exports and print headings.
  pub fn time_label(&self) -> String { format!("{} {}", self.time, self.period) }
}

fn resolve_clock(time: MassTime, period: Meridiem) -> NaiveTime {
  let hour = match (time.hour(), period) {
    (12, Meridiem::Am) => 0,
    (h, Meridiem::Pm) if h < 12 => h + 12,
    (h, _) => h,
  };
  NaiveTime::from_hms_opt(hour, time.minute(), 0).unwrap_or(time.0)
}

/// Validated input for [`ParishStore::create_mass`](crate::store::ParishStore::create_mass).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMass {
  pub date:   NaiveDate,
  pub time:   MassTime,
  pub period: Meridiem,
}

impl NewMass {
  /// Validate raw form values.
  ///
  /// Hours 13–23 only make sense as PM and hour 00 only as AM; any other
  /// combination is rejected rather than guessed.
  pub fn parse(date: &str, time: &str, period: &str) -> Result<Self> {
    let date = parse_date(date)?;
    let time = MassTime::parse(time)?;
    let period: Meridiem = period.parse()?;

    let mismatch = match period {
      Meridiem::Am => time.hour() > 12,
      Meridiem::Pm => time.hour() == 0,
    };
    if mismatch {
      return Err(Error::PeriodMismatch {
        time:   time.to_string(),
        period: period.to_string(),
      });
    }

    Ok(Self { date, time, period })
  }
}
