//! Installment expansion.
//!
//! A purchase split in `N` installments becomes `N` dated rows. The rows are
//! built here as plain values; persisting them (unpaid) is up to the caller.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Upper bound for `total_installments` (40 years of monthly payments).
pub const MAX_INSTALLMENTS: u32 = 480;

/// Due day used when the card does not define one.
pub const DEFAULT_DUE_DAY: u32 = 1;

/// One row produced by [`expand_installments`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSpec {
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub description: String,
    /// Shared by every row of the purchase; `None` for a single payment.
    pub group_id: Option<Uuid>,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
}

/// Expands a purchase into its installment rows.
///
/// - the total is split in integer cents; the first `amount % total` rows get
///   one extra cent, so the rows add up to `amount_minor` exactly
/// - the first row is due in the purchase month when the purchase day is on or
///   before `due_day`, otherwise in the following month
/// - row `i` is due `i - 1` months after the first, on `due_day` clamped to
///   the last day of shorter months
/// - with `total > 1` every row shares a fresh `group_id` and the description
///   gets an `" (i/N)"` suffix
///
/// ```rust
/// use chrono::NaiveDate;
/// use engine::expand_installments;
///
/// let purchase = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let rows = expand_installments(30_000, 3, purchase, Some(10), "TV").unwrap();
/// let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
/// assert_eq!(dates, ["2024-02-10", "2024-03-10", "2024-04-10"]);
/// assert_eq!(rows[0].description, "TV (1/3)");
/// ```
pub fn expand_installments(
    amount_minor: i64,
    total_installments: u32,
    purchase_date: NaiveDate,
    due_day: Option<u32>,
    description: &str,
) -> ResultEngine<Vec<InstallmentSpec>> {
    let group_id = (total_installments > 1).then(Uuid::new_v4);
    expand_in_group(
        amount_minor,
        total_installments,
        purchase_date,
        due_day,
        description,
        group_id,
    )
}

/// Same as [`expand_installments`], reusing an existing `group_id` when the
/// result has more than one row.
pub(crate) fn expand_in_group(
    amount_minor: i64,
    total_installments: u32,
    purchase_date: NaiveDate,
    due_day: Option<u32>,
    description: &str,
    group_id: Option<Uuid>,
) -> ResultEngine<Vec<InstallmentSpec>> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    if !(1..=MAX_INSTALLMENTS).contains(&total_installments) {
        return Err(EngineError::InvalidAmount(format!(
            "total_installments must be between 1 and {MAX_INSTALLMENTS}"
        )));
    }
    let due_day = due_day.unwrap_or(DEFAULT_DUE_DAY);
    if !(1..=31).contains(&due_day) {
        return Err(EngineError::InvalidDate(format!(
            "due_day must be between 1 and 31, got {due_day}"
        )));
    }
    let shares = MoneyCents::new(amount_minor)
        .split_evenly(total_installments)
        .ok_or_else(|| {
            EngineError::InvalidAmount(format!(
                "cannot split {amount_minor} cents in {total_installments} installments"
            ))
        })?;

    let (first_year, first_month) = if purchase_date.day() <= due_day {
        (purchase_date.year(), purchase_date.month())
    } else {
        add_months(purchase_date.year(), purchase_date.month(), 1)
    };

    let grouped = total_installments > 1;
    let group_id = if grouped {
        Some(group_id.unwrap_or_else(Uuid::new_v4))
    } else {
        None
    };

    shares
        .into_iter()
        .zip(1u32..)
        .map(|(share, number)| {
            let (year, month) = add_months(first_year, first_month, number - 1);
            let date = clamped_date(year, month, due_day)?;
            let description = if grouped {
                format!("{description} ({number}/{total_installments})")
            } else {
                description.to_string()
            };
            Ok(InstallmentSpec {
                amount_minor: share.cents(),
                date,
                purchase_date,
                description,
                group_id,
                installment_number: grouped.then_some(number),
                total_installments: grouped.then_some(total_installments),
            })
        })
        .collect()
}

fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let zero_based = i64::from(month) - 1 + i64::from(offset);
    let year = i64::from(year) + zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) + 1;
    (year as i32, month as u32)
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = add_months(year, month, 1);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
}

fn clamped_date(year: i32, month: u32, day: u32) -> ResultEngine<NaiveDate> {
    last_day_of_month(year, month)
        .and_then(|last| NaiveDate::from_ymd_opt(year, month, day.min(last)))
        .ok_or_else(|| EngineError::InvalidDate(format!("{year}-{month:02} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(rows: &[InstallmentSpec]) -> Vec<NaiveDate> {
        rows.iter().map(|r| r.date).collect()
    }

    #[test]
    fn purchase_after_due_day_rolls_to_next_month() {
        let rows = expand_installments(30_000, 3, date(2024, 1, 15), Some(10), "TV").unwrap();
        assert_eq!(
            dates(&rows),
            vec![date(2024, 2, 10), date(2024, 3, 10), date(2024, 4, 10)]
        );
        assert!(rows.iter().all(|r| r.amount_minor == 10_000));
        assert!(rows.iter().all(|r| r.purchase_date == date(2024, 1, 15)));
    }

    #[test]
    fn purchase_on_or_before_due_day_stays_in_month() {
        let rows = expand_installments(30_000, 3, date(2024, 1, 5), Some(10), "TV").unwrap();
        assert_eq!(rows[0].date, date(2024, 1, 10));
        let rows = expand_installments(30_000, 3, date(2024, 1, 10), Some(10), "TV").unwrap();
        assert_eq!(rows[0].date, date(2024, 1, 10));
    }

    #[test]
    fn due_day_is_clamped_to_short_months() {
        let rows = expand_installments(40_000, 4, date(2024, 1, 31), Some(31), "Sofa").unwrap();
        assert_eq!(
            dates(&rows),
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30)
            ]
        );
        let rows = expand_installments(20_000, 2, date(2023, 1, 31), Some(31), "Sofa").unwrap();
        assert_eq!(rows[1].date, date(2023, 2, 28));
    }

    #[test]
    fn year_rolls_over() {
        let rows = expand_installments(30_000, 3, date(2024, 12, 20), Some(5), "Trip").unwrap();
        assert_eq!(
            dates(&rows),
            vec![date(2025, 1, 5), date(2025, 2, 5), date(2025, 3, 5)]
        );
        let rows = expand_installments(30_000, 3, date(2024, 11, 1), Some(5), "Trip").unwrap();
        assert_eq!(
            dates(&rows),
            vec![date(2024, 11, 5), date(2024, 12, 5), date(2025, 1, 5)]
        );
    }

    #[test]
    fn remainder_goes_to_leading_installments() {
        let rows = expand_installments(10_000, 3, date(2024, 1, 1), Some(10), "Phone").unwrap();
        let amounts: Vec<i64> = rows.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![3_334, 3_333, 3_333]);
        assert_eq!(amounts.iter().sum::<i64>(), 10_000);
    }

    #[test]
    fn grouped_rows_share_group_and_numbering() {
        let rows = expand_installments(90_000, 3, date(2024, 1, 1), None, "Laptop").unwrap();
        let group_id = rows[0].group_id.unwrap();
        for (idx, row) in rows.iter().enumerate() {
            let number = idx as u32 + 1;
            assert_eq!(row.group_id, Some(group_id));
            assert_eq!(row.installment_number, Some(number));
            assert_eq!(row.total_installments, Some(3));
            assert_eq!(row.description, format!("Laptop ({number}/3)"));
        }
        // Default due day is the 1st.
        assert_eq!(rows[0].date, date(2024, 1, 1));
    }

    #[test]
    fn single_payment_has_no_group_but_rolls_date() {
        let rows = expand_installments(5_000, 1, date(2024, 3, 20), Some(10), "Book").unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.group_id, None);
        assert_eq!(row.installment_number, None);
        assert_eq!(row.total_installments, None);
        assert_eq!(row.description, "Book");
        assert_eq!(row.date, date(2024, 4, 10));
        assert_eq!(row.purchase_date, date(2024, 3, 20));
    }

    #[test]
    fn existing_group_is_reused() {
        let group_id = Uuid::new_v4();
        let rows = expand_in_group(20_000, 2, date(2024, 1, 1), Some(5), "Desk", Some(group_id))
            .unwrap();
        assert!(rows.iter().all(|r| r.group_id == Some(group_id)));
        let single =
            expand_in_group(20_000, 1, date(2024, 1, 1), Some(5), "Desk", Some(group_id)).unwrap();
        assert_eq!(single[0].group_id, None);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let day = date(2024, 1, 1);
        assert!(matches!(
            expand_installments(0, 3, day, Some(10), "x"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            expand_installments(1_000, 0, day, Some(10), "x"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            expand_installments(1_000_000, MAX_INSTALLMENTS + 1, day, Some(10), "x"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            expand_installments(2, 3, day, Some(10), "x"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            expand_installments(1_000, 2, day, Some(32), "x"),
            Err(EngineError::InvalidDate(_))
        ));
    }

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(last_day_of_month(2024, 2), Some(29));
        assert_eq!(last_day_of_month(2023, 2), Some(28));
        assert_eq!(last_day_of_month(2024, 12), Some(31));
        assert_eq!(last_day_of_month(2024, 4), Some(30));
    }
}
