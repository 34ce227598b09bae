//! Acquisition lifecycle and payment progress
//!
//! An acquisition is a user's claim on a catalog figure. Its status moves
//! reserved → ordered → owned, and four nullable dates record the payment
//! and delivery milestones. Every cross-field side effect lives in
//! [`apply_milestone`] and [`apply_amount_edit`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;
use super::figure::FigureSummary;
use super::serde_helpers::double_option;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    Reserved,
    Ordered,
    Owned,
}

impl AcquisitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionStatus::Reserved => "reserved",
            AcquisitionStatus::Ordered => "ordered",
            AcquisitionStatus::Owned => "owned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionStatus::Reserved => "예약",
            AcquisitionStatus::Ordered => "구매",
            AcquisitionStatus::Owned => "소장",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AcquisitionStatus::Reserved => "blue",
            AcquisitionStatus::Ordered => "amber",
            AcquisitionStatus::Owned => "emerald",
        }
    }
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AcquisitionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(AcquisitionStatus::Reserved),
            "ordered" => Ok(AcquisitionStatus::Ordered),
            "owned" => Ok(AcquisitionStatus::Owned),
            other => Err(DomainError::Validation(format!(
                "Unknown acquisition status: {}",
                other
            ))),
        }
    }
}

/// Independently trackable milestone dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    DepositPaid,
    BalancePaid,
    Paid,
    Delivered,
}

impl FromStr for Milestone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit_paid" => Ok(Milestone::DepositPaid),
            "balance_paid" => Ok(Milestone::BalancePaid),
            "paid" => Ok(Milestone::Paid),
            "delivered" => Ok(Milestone::Delivered),
            other => Err(DomainError::Validation(format!("Unknown milestone: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub id: i32,
    pub user_id: i32,
    pub figure_id: i32,
    /// Purchase site (shop master data)
    pub shop_id: Option<i32>,
    pub status: AcquisitionStatus,
    pub total_price: i64,
    pub deposit_price: Option<i64>,
    pub deposit_paid_at: Option<NaiveDate>,
    pub balance_paid_at: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
    pub delivered_at: Option<NaiveDate>,
    pub memo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Acquisition {
    pub fn milestone(&self, milestone: Milestone) -> Option<NaiveDate> {
        match milestone {
            Milestone::DepositPaid => self.deposit_paid_at,
            Milestone::BalancePaid => self.balance_paid_at,
            Milestone::Paid => self.paid_at,
            Milestone::Delivered => self.delivered_at,
        }
    }

    fn milestone_mut(&mut self, milestone: Milestone) -> &mut Option<NaiveDate> {
        match milestone {
            Milestone::DepositPaid => &mut self.deposit_paid_at,
            Milestone::BalancePaid => &mut self.balance_paid_at,
            Milestone::Paid => &mut self.paid_at,
            Milestone::Delivered => &mut self.delivered_at,
        }
    }

    /// Amount still due; an unset deposit counts as zero.
    pub fn remaining_amount(&self) -> i64 {
        self.total_price
            .saturating_sub(self.deposit_price.unwrap_or(0))
    }

    pub fn deposit_percentage(&self) -> Option<i64> {
        let deposit = self.deposit_price?;
        if self.total_price == 0 {
            return None;
        }
        Some(((deposit as f64 / self.total_price as f64) * 100.0).round() as i64)
    }

    /// Date the payment timeline uses: the deposit date, else the full payment date.
    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.deposit_paid_at.or(self.paid_at)
    }
}

/// Toggle a milestone: the field becomes `today` when unset, `None` when set.
/// Side effects follow [`set_milestone`].
pub fn apply_milestone(
    acquisition: &Acquisition,
    milestone: Milestone,
    today: NaiveDate,
) -> Acquisition {
    let toggled = match acquisition.milestone(milestone) {
        Some(_) => None,
        None => Some(today),
    };
    set_milestone(acquisition, milestone, toggled)
}

/// Write a milestone date and apply its side effects.
///
/// - `BalancePaid` copies its new value into `paid_at`;
/// - `Delivered` always leaves the status `Owned`.
pub fn set_milestone(
    acquisition: &Acquisition,
    milestone: Milestone,
    date: Option<NaiveDate>,
) -> Acquisition {
    let mut next = acquisition.clone();
    *next.milestone_mut(milestone) = date;

    match milestone {
        Milestone::BalancePaid => next.paid_at = date,
        Milestone::Delivered => next.status = AcquisitionStatus::Owned,
        Milestone::DepositPaid | Milestone::Paid => {}
    }

    next
}

/// Edit of one of the two displayed amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountEdit {
    /// Sets the deposit; the total is left alone.
    Deposit(i64),
    /// Sets the remaining balance by recomputing the total as balance + deposit.
    Balance(i64),
}

pub fn apply_amount_edit(
    acquisition: &Acquisition,
    edit: AmountEdit,
) -> Result<Acquisition, DomainError> {
    let mut next = acquisition.clone();
    match edit {
        AmountEdit::Deposit(amount) => {
            if amount < 0 || amount > acquisition.total_price {
                return Err(DomainError::Validation(format!(
                    "deposit must be between 0 and {}",
                    acquisition.total_price
                )));
            }
            next.deposit_price = Some(amount);
        }
        AmountEdit::Balance(amount) => {
            if amount < 0 {
                return Err(DomainError::Validation(
                    "balance must not be negative".to_string(),
                ));
            }
            next.total_price = amount
                .checked_add(acquisition.deposit_price.unwrap_or(0))
                .ok_or_else(|| DomainError::Validation("balance too large".to_string()))?;
        }
    }
    Ok(next)
}

/// Partial-field update. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AcquisitionPatch {
    pub status: Option<AcquisitionStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub shop_id: Option<Option<i32>>,
    pub total_price: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub deposit_price: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub deposit_paid_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub balance_paid_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub paid_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivered_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub memo: Option<Option<String>>,
}

impl AcquisitionPatch {
    /// Only the fields that differ between `before` and `after`.
    pub fn between(before: &Acquisition, after: &Acquisition) -> Self {
        fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
            (a != b).then(|| b.clone())
        }

        Self {
            status: changed(&before.status, &after.status),
            shop_id: changed(&before.shop_id, &after.shop_id),
            total_price: changed(&before.total_price, &after.total_price),
            deposit_price: changed(&before.deposit_price, &after.deposit_price),
            deposit_paid_at: changed(&before.deposit_paid_at, &after.deposit_paid_at),
            balance_paid_at: changed(&before.balance_paid_at, &after.balance_paid_at),
            paid_at: changed(&before.paid_at, &after.paid_at),
            delivered_at: changed(&before.delivered_at, &after.delivered_at),
            memo: changed(&before.memo, &after.memo),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Result of applying the patch, used to check invariants before persisting.
    ///
    /// Milestone dates go through [`set_milestone`] after the plain fields,
    /// so a delivery date forces `Owned` and a balance date overrides `paid_at`.
    pub fn applied_to(&self, acquisition: &Acquisition) -> Acquisition {
        let mut next = acquisition.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(shop_id) = self.shop_id {
            next.shop_id = shop_id;
        }
        if let Some(total) = self.total_price {
            next.total_price = total;
        }
        if let Some(deposit) = self.deposit_price {
            next.deposit_price = deposit;
        }
        if let Some(memo) = &self.memo {
            next.memo = memo.clone();
        }
        for (milestone, date) in [
            (Milestone::DepositPaid, self.deposit_paid_at),
            (Milestone::Paid, self.paid_at),
            (Milestone::BalancePaid, self.balance_paid_at),
        ] {
            if let Some(date) = date {
                next = set_milestone(&next, milestone, date);
            }
        }
        // A cleared delivery date has no side effect.
        match self.delivered_at {
            Some(Some(date)) => next = set_milestone(&next, Milestone::Delivered, Some(date)),
            Some(None) => next.delivered_at = None,
            None => {}
        }
        next
    }
}

/// Price checks shared by creation and patching.
pub fn validate_amounts(total_price: i64, deposit_price: Option<i64>) -> Result<(), DomainError> {
    if total_price < 0 {
        return Err(DomainError::Validation(
            "total_price must not be negative".to_string(),
        ));
    }
    if let Some(deposit) = deposit_price {
        if deposit < 0 || deposit > total_price {
            return Err(DomainError::Validation(format!(
                "deposit must be between 0 and {}",
                total_price
            )));
        }
    }
    Ok(())
}

/// An acquisition together with the figure it tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFigure {
    pub acquisition: Acquisition,
    pub figure: FigureSummary,
}

/// UI-facing read model with derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionView {
    #[serde(flatten)]
    pub acquisition: Acquisition,
    pub figure: Option<FigureSummary>,
    pub balance_price: i64,
    pub remaining_amount: i64,
    pub deposit_percentage: Option<i64>,
    pub status_label: &'static str,
    pub status_color: &'static str,
}

impl AcquisitionView {
    pub fn new(acquisition: Acquisition, figure: Option<FigureSummary>) -> Self {
        let remaining = acquisition.remaining_amount();
        Self {
            balance_price: remaining,
            remaining_amount: remaining,
            deposit_percentage: acquisition.deposit_percentage(),
            status_label: acquisition.status.label(),
            status_color: acquisition.status.color(),
            acquisition,
            figure,
        }
    }
}

impl From<TrackedFigure> for AcquisitionView {
    fn from(tracked: TrackedFigure) -> Self {
        AcquisitionView::new(tracked.acquisition, Some(tracked.figure))
    }
}
