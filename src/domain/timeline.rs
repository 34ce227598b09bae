//! Yearly calendar timeline of a user's acquisitions.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::acquisition::{AcquisitionStatus, TrackedFigure};

/// Which date places an acquisition on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// Deposit date, falling back to the full payment date
    #[default]
    Payment,
    /// The figure's release date
    Release,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineQuery {
    pub year: i32,
    pub field: DateField,
    pub exclude_owned: bool,
}

fn parse_release_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?, "%Y-%m-%d").ok()
}

/// The date `field` selects for an entry, if it has one that parses.
pub fn grouping_date(entry: &TrackedFigure, field: DateField) -> Option<NaiveDate> {
    match field {
        DateField::Payment => entry.acquisition.payment_date(),
        DateField::Release => parse_release_date(entry.figure.release_date.as_deref()),
    }
}

/// Descending by (payment date, created_at); entries without a payment date last.
fn newest_first(a: &TrackedFigure, b: &TrackedFigure) -> Ordering {
    let by_payment = match (a.acquisition.payment_date(), b.acquisition.payment_date()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_payment.then_with(|| b.acquisition.created_at.cmp(&a.acquisition.created_at))
}

/// Group entries by month index (0–11) within `query.year`.
///
/// Entries without a usable date are dropped silently. Only non-empty months
/// appear in the map.
pub fn group_by_month(
    entries: &[TrackedFigure],
    query: &TimelineQuery,
) -> BTreeMap<u32, Vec<TrackedFigure>> {
    let mut months: BTreeMap<u32, Vec<TrackedFigure>> = BTreeMap::new();

    for entry in entries {
        if query.exclude_owned && entry.acquisition.status == AcquisitionStatus::Owned {
            continue;
        }
        let Some(date) = grouping_date(entry, query.field) else {
            continue;
        };
        if date.year() != query.year {
            continue;
        }
        months.entry(date.month0()).or_default().push(entry.clone());
    }

    for bucket in months.values_mut() {
        bucket.sort_by(newest_first);
    }

    months
}

/// Per-month totals shown in the calendar header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub count: usize,
    pub total_price: i64,
    pub deposit_total: i64,
    pub remaining_total: i64,
}

impl MonthSummary {
    pub fn of(entries: &[TrackedFigure]) -> Self {
        entries.iter().fold(Self::default(), |mut sum, entry| {
            let acq = &entry.acquisition;
            sum.count += 1;
            sum.add(acq.total_price, acq.deposit_price.unwrap_or(0), acq.remaining_amount());
            sum
        })
    }

    // Totals saturate instead of overflowing on absurd prices.
    fn add(&mut self, total: i64, deposit: i64, remaining: i64) {
        self.total_price = self.total_price.saturating_add(total);
        self.deposit_total = self.deposit_total.saturating_add(deposit);
        self.remaining_total = self.remaining_total.saturating_add(remaining);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineMonth {
    /// 0 = January
    pub month: u32,
    pub summary: MonthSummary,
    pub entries: Vec<TrackedFigure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub year: i32,
    pub field: DateField,
    pub exclude_owned: bool,
    pub summary: MonthSummary,
    /// Always twelve months, January first
    pub months: Vec<TimelineMonth>,
}

impl Timeline {
    pub fn build(entries: &[TrackedFigure], query: TimelineQuery) -> Self {
        let mut grouped = group_by_month(entries, &query);

        let months: Vec<TimelineMonth> = (0..12)
            .map(|month| {
                let entries = grouped.remove(&month).unwrap_or_default();
                TimelineMonth {
                    month,
                    summary: MonthSummary::of(&entries),
                    entries,
                }
            })
            .collect();

        let summary = months.iter().fold(MonthSummary::default(), |mut sum, m| {
            sum.count += m.summary.count;
            sum.add(
                m.summary.total_price,
                m.summary.deposit_total,
                m.summary.remaining_total,
            );
            sum
        });

        Self {
            year: query.year,
            field: query.field,
            exclude_owned: query.exclude_owned,
            summary,
            months,
        }
    }
}

/// Years that have at least one entry under `field`, newest first.
pub fn available_years(entries: &[TrackedFigure], field: DateField) -> Vec<i32> {
    let years: BTreeSet<i32> = entries
        .iter()
        .filter_map(|entry| grouping_date(entry, field))
        .map(|date| date.year())
        .collect();
    years.into_iter().rev().collect()
}
