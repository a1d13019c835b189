//! String <-> date conversion under a display format, and the calendar-day
//! records the popover renders from.
//!
//! Nothing on the parse path errors: unparseable input degrades to `None`
//! (or to the raw string for [`DateUtilities::value_to_input_format`]) so a
//! half-typed field never blows up.

use chrono::format::{parse, Item, Parsed, StrftimeItems};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt::{self, Write as _};

use crate::calendar::{first_of_month, month_weeks};

pub const DEFAULT_DISPLAY_FORMAT: &str = "yyyy/MM/dd";

// ─── Display format ───────────────────────────────────────────────────────────

/// A display pattern, either in `yyyy-MM-dd` token syntax or a raw chrono
/// strftime pattern (anything containing `%`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    pattern:  String,
    strftime: String,
}

impl DisplayFormat {
    pub fn new(pattern: &str) -> Self {
        let strftime = if pattern.contains('%') {
            pattern.to_owned()
        } else {
            tokens_to_strftime(pattern)
        };
        Self { pattern: pattern.to_owned(), strftime }
    }

    pub fn pattern(&self)  -> &str { &self.pattern }
    pub fn strftime(&self) -> &str { &self.strftime }

    /// Whether chrono understands every specifier in the translated pattern.
    pub fn is_valid(&self) -> bool {
        !StrftimeItems::new(&self.strftime).any(|i| matches!(i, Item::Error))
    }
}

impl Default for DisplayFormat {
    fn default() -> Self { Self::new(DEFAULT_DISPLAY_FORMAT) }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.pattern) }
}

fn tokens_to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // '' is a literal quote, anything else opens a quoted literal.
            if chars.get(i + 1) == Some(&'\'') { out.push('\''); i += 2; continue; }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') { out.push('\''); i += 2; continue; }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y', 2)         => Some("%y"),
            ('y', _)         => Some("%Y"),
            ('M', 1)         => Some("%-m"),
            ('M', 2)         => Some("%m"),
            ('M', 3)         => Some("%b"),
            ('M', _)         => Some("%B"),
            ('d', 1)         => Some("%-d"),
            ('d', _)         => Some("%d"),
            ('E', 1..=3)     => Some("%a"),
            ('E', _)         => Some("%A"),
            _                => None,
        };
        match spec {
            Some(s) => out.push_str(s),
            None    => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' { out.push_str("%%") } else { out.push(c) }
}

// ─── Period ───────────────────────────────────────────────────────────────────

/// The month shown by the calendar grid. `month` is 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year:  i32,
    pub month: u32,
}

impl Period {
    /// Builds a period, carrying an out-of-range month into the year.
    pub fn new(year: i32, month: i32) -> Self {
        Self { year: year + month.div_euclid(12), month: month.rem_euclid(12) as u32 }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month0() }
    }

    pub fn next(self) -> Self { Self::new(self.year, self.month as i32 + 1) }
    pub fn prev(self) -> Self { Self::new(self.year, self.month as i32 - 1) }

    pub fn first_day(self) -> Option<NaiveDate> { first_of_month(self.year, self.month as i32) }

    pub fn contains(self, date: NaiveDate) -> bool { Self::of(date) == self }
}

// ─── Calendar day ─────────────────────────────────────────────────────────────

/// One cell of the calendar grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date:             NaiveDate,
    pub key:              String,
    pub in_current_month: bool,
    pub disabled:         bool,
    pub is_today:         bool,
    pub is_selected:      bool,
}

// ─── Utilities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DateUtilities {
    format: DisplayFormat,
}

impl DateUtilities {
    pub fn new(format: DisplayFormat) -> Self { Self { format } }

    /// Renders `date` in the display format; `None` renders as `""`.
    pub fn format_date_to_string(&self, date: Option<NaiveDate>) -> String {
        let Some(date) = date else { return String::new() };
        let mut out = String::new();
        match write!(out, "{}", date.format(self.format.strftime())) {
            Ok(())  => out,
            Err(_)  => {
                tracing::warn!("display format {:?} cannot render dates", self.format.pattern());
                String::new()
            }
        }
    }

    /// Parses `value` under the display format. Empty input, a mismatch, or a
    /// date that doesn't exist on the calendar all yield `None`.
    pub fn parse_date_string(&self, value: Option<&str>) -> Option<NaiveDate> {
        self.parse_date_string_at(value, today())
    }

    /// Like [`Self::parse_date_string`]. Patterns that leave fields out take
    /// the year from `today`, and the month and day from 1.
    pub fn parse_date_string_at(&self, value: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
        let value = value.filter(|v| !v.is_empty())?;
        let mut parsed = Parsed::new();
        parse(&mut parsed, value, StrftimeItems::new(self.format.strftime())).ok()?;

        let has_year = parsed.year().is_some()
            || parsed.year_div_100().is_some()
            || parsed.year_mod_100().is_some();
        if !has_year {
            parsed.set_year(today.year().into()).ok()?;
        }
        if parsed.ordinal().is_none() {
            if parsed.month().is_none() { parsed.set_month(1).ok()?; }
            if parsed.day().is_none()   { parsed.set_day(1).ok()?; }
        }
        parsed.to_naive_date().ok()
    }

    pub fn get_period_from_value(&self, value: &str) -> Period {
        self.get_period_from_value_at(value, today())
    }

    /// Period of the parsed `value`, falling back to `today`'s period.
    pub fn get_period_from_value_at(&self, value: &str, today: NaiveDate) -> Period {
        Period::of(self.parse_date_string_at(Some(value), today).unwrap_or(today))
    }

    /// Normalizes `value` to its canonical rendering, or returns it untouched
    /// when it does not parse.
    pub fn value_to_input_format(&self, value: &str) -> String {
        let formatted = self.format_date_to_string(self.parse_date_string(Some(value)));
        if formatted.is_empty() { value.to_owned() } else { formatted }
    }

    pub fn is_today(&self, date: NaiveDate, today: NaiveDate) -> bool { self.is_same_day(date, today) }

    pub fn is_same_day(&self, a: NaiveDate, b: NaiveDate) -> bool { a == b }

    /// Builds the grid for `period` one week per row, flagging the day
    /// matching `value`, `today`, and anything `is_disabled` rejects.
    pub fn calendar_weeks(
        &self,
        period:      Period,
        value:       &str,
        today:       NaiveDate,
        is_disabled: &dyn Fn(NaiveDate) -> bool,
    ) -> Vec<Vec<CalendarDay>> {
        let selected = self.parse_date_string_at(Some(value), today);
        let day = |date: NaiveDate| CalendarDay {
            date,
            key:              self.format_date_to_string(Some(date)),
            in_current_month: period.contains(date),
            disabled:         is_disabled(date),
            is_today:         self.is_today(date, today),
            is_selected:      selected.is_some_and(|s| self.is_same_day(s, date)),
        };
        month_weeks(period.year, period.month as i32)
            .into_iter()
            .map(|week| week.into_iter().map(&day).collect())
            .collect()
    }
}

pub fn today() -> NaiveDate { Local::now().date_naive() }
