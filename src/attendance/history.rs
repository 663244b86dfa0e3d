use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceLogEntry, AttendanceType};

/// How a calendar day reads from the log. Leave beats half day beats a
/// plain punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Half,
    Leave,
}

impl DayStatus {
    fn from_type(kind: AttendanceType) -> Self {
        match kind {
            AttendanceType::In | AttendanceType::Out => DayStatus::Present,
            AttendanceType::HalfDay => DayStatus::Half,
            AttendanceType::Leave => DayStatus::Leave,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CalendarDay {
    #[schema(example = "2026-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(nullable = true)]
    pub status: Option<DayStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailySummary {
    #[schema(example = "2026-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,
    /// Distinct staff who punched in.
    pub present: usize,
    /// Distinct staff on leave.
    pub on_leave: usize,
}

fn statuses_by_day(logs: &[AttendanceLogEntry]) -> HashMap<NaiveDate, DayStatus> {
    let mut days: HashMap<NaiveDate, DayStatus> = HashMap::new();
    for entry in logs {
        let (Some(day), Some(kind)) = (entry.day(), entry.attendance_type()) else {
            continue;
        };
        let status = DayStatus::from_type(kind);
        days.entry(day)
            .and_modify(|s| *s = (*s).max(status))
            .or_insert(status);
    }
    days
}

/// First and last day of a month, or None for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub fn month_calendar(logs: &[AttendanceLogEntry], first: NaiveDate) -> Vec<CalendarDay> {
    let statuses = statuses_by_day(logs);
    first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .map(|date| CalendarDay {
            date,
            status: statuses.get(&date).copied(),
        })
        .collect()
}

/// Leave and half-day entries, newest first as the portal returns them.
pub fn leave_records(logs: &[AttendanceLogEntry]) -> Vec<AttendanceLogEntry> {
    logs.iter()
        .filter(|e| e.attendance_type().is_some_and(AttendanceType::requires_reason))
        .cloned()
        .collect()
}

pub fn daily_summary(logs: &[AttendanceLogEntry], date: NaiveDate) -> DailySummary {
    let mut present = HashSet::new();
    let mut on_leave = HashSet::new();
    for entry in logs.iter().filter(|e| e.day() == Some(date)) {
        let Some(name) = entry.name.as_deref() else {
            continue;
        };
        match entry.attendance_type() {
            Some(AttendanceType::In) => {
                present.insert(name);
            }
            Some(AttendanceType::Leave) => {
                on_leave.insert(name);
            }
            _ => {}
        }
    }
    DailySummary {
        date,
        present: present.len(),
        on_leave: on_leave.len(),
    }
}
