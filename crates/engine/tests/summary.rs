mod common;

use common::{bank_with_card, date, engine_with_db};
use engine::{
    CardKind, CreateTransactionCmd, Engine, EngineError, NewCardCmd, SummaryFilter, TOTAL_ROW,
    TransactionKind, UNCATEGORIZED,
};
use uuid::Uuid;

async fn expense(
    engine: &Engine,
    card_id: Uuid,
    amount: i64,
    on: chrono::NaiveDate,
    category: Option<Uuid>,
) {
    let mut cmd = CreateTransactionCmd::new(
        "alice",
        card_id,
        TransactionKind::Expense,
        amount,
        "Spend",
        on,
    );
    if let Some(category_id) = category {
        cmd = cmd.category(category_id);
    }
    engine.create_transaction(cmd).await.unwrap();
}

#[tokio::test]
async fn bank_summary_totals_every_bank() {
    let (engine, _db) = engine_with_db().await;
    let (nubank, card) = bank_with_card(&engine, "alice", "Nubank", 1_000, None).await;
    engine.create_bank("alice", "Inter", 250).await.unwrap();
    engine.create_bank("bob", "Caixa", 99_999).await.unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                card.id,
                TransactionKind::Expense,
                300,
                "Taxi",
                date(2024, 1, 1),
            )
            .paid(true),
        )
        .await
        .unwrap();

    let summary = engine.bank_summary("alice").await.unwrap();
    assert_eq!(summary.banks.len(), 2);
    assert_eq!(summary.banks[0].name, "Inter");
    assert_eq!(summary.banks[1].bank_id, nubank.id);
    assert_eq!(summary.banks[1].current_balance, 700);
    assert_eq!(summary.total_minor, 950);

    let empty = engine.bank_summary("nobody").await.unwrap();
    assert!(empty.banks.is_empty());
    assert_eq!(empty.total_minor, 0);
}

#[tokio::test]
async fn expense_totals_group_by_month_or_day() {
    let (engine, _db) = engine_with_db().await;
    let (_bank, card) = bank_with_card(&engine, "alice", "Nubank", 0, None).await;

    expense(&engine, card.id, 100, date(2024, 1, 3), None).await;
    expense(&engine, card.id, 200, date(2024, 1, 3), None).await;
    expense(&engine, card.id, 400, date(2024, 1, 20), None).await;
    expense(&engine, card.id, 800, date(2024, 2, 1), None).await;
    engine
        .create_transaction(CreateTransactionCmd::new(
            "alice",
            card.id,
            TransactionKind::Payment,
            5_000,
            "Bill payment",
            date(2024, 1, 10),
        ))
        .await
        .unwrap();

    let monthly = engine
        .expense_totals("alice", &SummaryFilter::default())
        .await
        .unwrap();
    let monthly: Vec<(String, i64)> = monthly
        .into_iter()
        .map(|row| (row.period, row.total_minor))
        .collect();
    assert_eq!(
        monthly,
        vec![("2024-01".to_string(), 700), ("2024-02".to_string(), 800)]
    );

    let daily = engine
        .expense_totals(
            "alice",
            &SummaryFilter {
                year: Some(2024),
                month: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let daily: Vec<(String, i64)> = daily
        .into_iter()
        .map(|row| (row.period, row.total_minor))
        .collect();
    assert_eq!(
        daily,
        vec![("2024-01-03".to_string(), 300), ("2024-01-20".to_string(), 400)]
    );

    let ranged = engine
        .expense_totals(
            "alice",
            &SummaryFilter {
                from: Some(date(2024, 1, 20)),
                to: Some(date(2024, 2, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ranged.iter().map(|r| r.total_minor).sum::<i64>(), 1_200);
}

#[tokio::test]
async fn summary_filter_rejects_bad_ranges() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .expense_totals(
            "alice",
            &SummaryFilter {
                month: Some(13),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));

    let err = engine
        .category_totals(
            "alice",
            &SummaryFilter {
                from: Some(date(2024, 2, 1)),
                to: Some(date(2024, 1, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn category_totals_include_uncategorized_bucket() {
    let (engine, _db) = engine_with_db().await;
    let (_bank, card) = bank_with_card(&engine, "alice", "Nubank", 0, None).await;
    let food = engine
        .create_category("alice", "Food", Some("#ff0000"))
        .await
        .unwrap();
    let fun = engine.create_category("alice", "Fun", None).await.unwrap();

    expense(&engine, card.id, 900, date(2024, 1, 1), Some(food.id)).await;
    expense(&engine, card.id, 100, date(2024, 1, 2), Some(food.id)).await;
    expense(&engine, card.id, 300, date(2024, 1, 3), Some(fun.id)).await;
    expense(&engine, card.id, 50, date(2024, 1, 4), None).await;

    let totals = engine
        .category_totals("alice", &SummaryFilter::default())
        .await
        .unwrap();
    assert_eq!(totals.len(), 3);
    assert_eq!(totals[0].name, "Food");
    assert_eq!(totals[0].color.as_deref(), Some("#ff0000"));
    assert_eq!(totals[0].total_minor, 1_000);
    assert_eq!(totals[1].name, "Fun");
    assert_eq!(totals[1].color.as_deref(), Some("#007bff"));
    assert_eq!(totals[2].category_id, None);
    assert_eq!(totals[2].name, UNCATEGORIZED);
    assert_eq!(totals[2].total_minor, 50);

    let only_fun = engine
        .category_totals(
            "alice",
            &SummaryFilter {
                category_id: Some(fun.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_fun.len(), 1);
    assert_eq!(only_fun[0].total_minor, 300);
}

#[tokio::test]
async fn card_totals_are_sorted_by_amount() {
    let (engine, _db) = engine_with_db().await;
    let (nubank, nu_card) = bank_with_card(&engine, "alice", "Nubank", 0, None).await;
    let (_inter, inter_card) = bank_with_card(&engine, "alice", "Inter", 0, None).await;

    expense(&engine, nu_card.id, 100, date(2024, 1, 1), None).await;
    expense(&engine, inter_card.id, 700, date(2024, 1, 1), None).await;

    let totals = engine
        .card_totals("alice", &SummaryFilter::default())
        .await
        .unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].card_id, inter_card.id);
    assert_eq!(totals[0].bank_name, "Inter");
    assert_eq!(totals[0].card_name, "Inter card");
    assert_eq!(totals[1].total_minor, 100);

    let nubank_only = engine
        .card_totals(
            "alice",
            &SummaryFilter {
                bank_id: Some(nubank.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(nubank_only.len(), 1);
    assert_eq!(nubank_only[0].card_id, nu_card.id);
}

#[tokio::test]
async fn credit_usage_counts_unpaid_expenses() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine.create_bank("alice", "Nubank", 0).await.unwrap();
    let gold = engine
        .create_card(
            NewCardCmd::new("alice", bank.id, "Gold", CardKind::Credit)
                .limit_minor(10_000)
                .due_day(10),
        )
        .await
        .unwrap();
    let platinum = engine
        .create_card(
            NewCardCmd::new("alice", bank.id, "Platinum", CardKind::Credit).limit_minor(5_000),
        )
        .await
        .unwrap();
    // No limit: left out of the report.
    engine
        .create_card(NewCardCmd::new("alice", bank.id, "Virtual", CardKind::Credit))
        .await
        .unwrap();

    expense(&engine, gold.id, 3_000, date(2024, 1, 1), None).await;
    engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                gold.id,
                TransactionKind::Expense,
                1_000,
                "Paid off",
                date(2024, 1, 1),
            )
            .paid(true),
        )
        .await
        .unwrap();
    expense(&engine, platinum.id, 6_000, date(2024, 1, 1), None).await;

    let usage = engine.credit_usage("alice").await.unwrap();
    assert_eq!(usage.len(), 3);
    let row_of = |card_id: Uuid| {
        usage
            .iter()
            .find(|row| row.card_id == Some(card_id))
            .unwrap()
    };
    assert_eq!(row_of(gold.id).used_minor, 3_000);
    assert_eq!(row_of(gold.id).available_minor, 7_000);
    assert_eq!(row_of(platinum.id).available_minor, -1_000);

    let total = &usage[2];
    assert_eq!(total.card_id, None);
    assert_eq!(total.name, TOTAL_ROW);
    assert_eq!(total.limit_minor, 15_000);
    assert_eq!(total.used_minor, 9_000);
    assert_eq!(total.available_minor, 6_000);
}
