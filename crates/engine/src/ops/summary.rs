//! Read-only rollups.
//!
//! Everything here scans rows with plain queries on the shared connection and
//! never writes.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use sea_orm::{Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CardKind, EngineError, ResultEngine, TransactionKind, banks, cards, categories, transactions,
    util::add_minor,
};

use super::{Engine, access::PostedTransaction};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const TOTAL_ROW: &str = "TOTAL";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankBalance {
    pub bank_id: Uuid,
    pub name: String,
    pub current_balance: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSummary {
    pub banks: Vec<BankBalance>,
    pub total_minor: i64,
}

/// Expense total for a month (`YYYY-MM`) or a day (`YYYY-MM-DD`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// `None` for uncategorized expenses.
    pub category_id: Option<Uuid>,
    pub name: String,
    pub color: Option<String>,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTotal {
    pub card_id: Uuid,
    pub card_name: String,
    pub bank_name: String,
    pub total_minor: i64,
}

/// Credit usage of one card, or the `TOTAL` row (`card_id == None`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRow {
    pub card_id: Option<Uuid>,
    pub name: String,
    pub limit_minor: i64,
    pub used_minor: i64,
    pub available_minor: i64,
}

/// Filters shared by the expense rollups.
///
/// `from`/`to` are inclusive. `year` and `month` restrict the due date; with
/// both set, [`Engine::expense_totals`] groups by day instead of by month.
#[derive(Clone, Debug, Default)]
pub struct SummaryFilter {
    pub bank_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl SummaryFilter {
    fn validate(&self) -> ResultEngine<()> {
        if let Some(month) = self.month
            && !(1..=12).contains(&month)
        {
            return Err(EngineError::InvalidDate(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::InvalidDate(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        Ok(())
    }

    fn condition(&self) -> Condition {
        let mut cond = Condition::all()
            .add(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()));
        if let Some(bank_id) = self.bank_id {
            cond = cond.add(cards::Column::BankId.eq(bank_id));
        }
        if let Some(card_id) = self.card_id {
            cond = cond.add(transactions::Column::CardId.eq(card_id));
        }
        if let Some(category_id) = self.category_id {
            cond = cond.add(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(from) = self.from {
            cond = cond.add(transactions::Column::Date.gte(from));
        }
        if let Some(to) = self.to {
            cond = cond.add(transactions::Column::Date.lte(to));
        }
        cond
    }

    fn matches(&self, date: NaiveDate) -> bool {
        self.year.is_none_or(|year| date.year() == year)
            && self.month.is_none_or(|month| date.month() == month)
    }

    fn by_day(&self) -> bool {
        self.year.is_some() && self.month.is_some()
    }
}

impl Engine {
    /// One row per bank with its stored balance, plus the grand total.
    pub async fn bank_summary(&self, user_id: &str) -> ResultEngine<BankSummary> {
        let models = banks::Entity::find()
            .filter(banks::Column::UserId.eq(user_id))
            .order_by_asc(banks::Column::NameNorm)
            .all(&self.database)
            .await?;
        let banks: Vec<BankBalance> = models
            .into_iter()
            .map(|model| BankBalance {
                bank_id: model.id,
                name: model.name,
                current_balance: model.current_balance,
            })
            .collect();
        let total_minor = banks
            .iter()
            .try_fold(0, |acc, b| add_minor(acc, b.current_balance))?;
        Ok(BankSummary { banks, total_minor })
    }

    async fn scan_expenses(
        &self,
        user_id: &str,
        filter: &SummaryFilter,
    ) -> ResultEngine<Vec<PostedTransaction>> {
        filter.validate()?;
        let rows = self
            .find_posted(&self.database, Some(user_id), filter.condition())
            .await?;
        Ok(rows
            .into_iter()
            .filter(|row| filter.matches(row.tx.date))
            .collect())
    }

    /// Expense totals by month (`YYYY-MM`), or by day (`YYYY-MM-DD`) when
    /// both `year` and `month` are set, in chronological order.
    pub async fn expense_totals(
        &self,
        user_id: &str,
        filter: &SummaryFilter,
    ) -> ResultEngine<Vec<PeriodTotal>> {
        let rows = self.scan_expenses(user_id, filter).await?;
        let by_day = filter.by_day();

        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for row in rows {
            let period = if by_day {
                row.tx.date.format("%Y-%m-%d").to_string()
            } else {
                row.tx.date.format("%Y-%m").to_string()
            };
            let total = totals.entry(period).or_default();
            *total = add_minor(*total, row.tx.amount_minor)?;
        }
        Ok(totals
            .into_iter()
            .map(|(period, total_minor)| PeriodTotal {
                period,
                total_minor,
            })
            .collect())
    }

    /// Expense totals per category, largest first.
    pub async fn category_totals(
        &self,
        user_id: &str,
        filter: &SummaryFilter,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let rows = self.scan_expenses(user_id, filter).await?;
        let categories: HashMap<Uuid, categories::Model> = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        let mut totals: HashMap<Option<Uuid>, i64> = HashMap::new();
        for row in rows {
            let total = totals.entry(row.tx.category_id).or_default();
            *total = add_minor(*total, row.tx.amount_minor)?;
        }

        let mut out: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category_id, total_minor)| {
                let model = category_id.and_then(|id| categories.get(&id));
                CategoryTotal {
                    category_id,
                    name: model.map_or_else(|| UNCATEGORIZED.to_string(), |m| m.name.clone()),
                    color: model.map(|m| m.color.clone()),
                    total_minor,
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(out)
    }

    /// Expense totals per card, largest first.
    pub async fn card_totals(
        &self,
        user_id: &str,
        filter: &SummaryFilter,
    ) -> ResultEngine<Vec<CardTotal>> {
        let rows = self.scan_expenses(user_id, filter).await?;
        let names = self.card_names(user_id).await?;

        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for row in rows {
            let total = totals.entry(row.tx.card_id).or_default();
            *total = add_minor(*total, row.tx.amount_minor)?;
        }

        let mut out: Vec<CardTotal> = totals
            .into_iter()
            .map(|(card_id, total_minor)| {
                let (card_name, bank_name) = names.get(&card_id).cloned().unwrap_or_default();
                CardTotal {
                    card_id,
                    card_name,
                    bank_name,
                    total_minor,
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then_with(|| a.card_name.cmp(&b.card_name))
        });
        Ok(out)
    }

    /// For each credit card with a limit: unpaid expenses used against it and
    /// what is left. The last row is the `TOTAL` across those cards.
    pub async fn credit_usage(&self, user_id: &str) -> ResultEngine<Vec<UsageRow>> {
        let credit_cards: Vec<cards::Model> = cards::Entity::find()
            .join(JoinType::InnerJoin, cards::Relation::Bank.def())
            .filter(banks::Column::UserId.eq(user_id))
            .filter(cards::Column::Kind.eq(CardKind::Credit.as_str()))
            .filter(cards::Column::LimitMinor.is_not_null())
            .order_by_asc(cards::Column::CreatedAt)
            .order_by_asc(cards::Column::Id)
            .all(&self.database)
            .await?;

        let unpaid = self
            .find_posted(
                &self.database,
                Some(user_id),
                Condition::all()
                    .add(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
                    .add(transactions::Column::IsPaid.eq(false)),
            )
            .await?;
        let mut used: HashMap<Uuid, i64> = HashMap::new();
        for row in unpaid {
            let total = used.entry(row.tx.card_id).or_default();
            *total = add_minor(*total, row.tx.amount_minor)?;
        }

        let mut out = Vec::with_capacity(credit_cards.len() + 1);
        let mut total = UsageRow {
            card_id: None,
            name: TOTAL_ROW.to_string(),
            limit_minor: 0,
            used_minor: 0,
            available_minor: 0,
        };
        for card in credit_cards {
            let limit_minor = card.limit_minor.unwrap_or_default();
            let used_minor = used.get(&card.id).copied().unwrap_or(0);
            let row = UsageRow {
                card_id: Some(card.id),
                name: card.name,
                limit_minor,
                used_minor,
                available_minor: add_minor(limit_minor, -used_minor)?,
            };
            total.limit_minor = add_minor(total.limit_minor, row.limit_minor)?;
            total.used_minor = add_minor(total.used_minor, row.used_minor)?;
            total.available_minor = add_minor(total.available_minor, row.available_minor)?;
            out.push(row);
        }
        out.push(total);
        Ok(out)
    }

    async fn card_names(&self, user_id: &str) -> ResultEngine<HashMap<Uuid, (String, String)>> {
        let rows: Vec<(cards::Model, Option<banks::Model>)> = cards::Entity::find()
            .find_also_related(banks::Entity)
            .filter(banks::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(card, bank)| bank.map(|bank| (card.id, (card.name, bank.name))))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_groups_by_day_only_with_year_and_month() {
        let mut filter = SummaryFilter {
            year: Some(2024),
            ..Default::default()
        };
        assert!(!filter.by_day());
        filter.month = Some(3);
        assert!(filter.by_day());
    }

    #[test]
    fn filter_matches_year_and_month() {
        let filter = SummaryFilter {
            year: Some(2024),
            month: Some(2),
            ..Default::default()
        };
        assert!(filter.matches(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!filter.matches(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
        assert!(!filter.matches(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

        let month_only = SummaryFilter {
            month: Some(2),
            ..Default::default()
        };
        assert!(month_only.matches(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
    }

    #[test]
    fn invalid_month_is_rejected() {
        let filter = SummaryFilter {
            month: Some(13),
            ..Default::default()
        };
        assert!(matches!(filter.validate(), Err(EngineError::InvalidDate(_))));
    }
}
