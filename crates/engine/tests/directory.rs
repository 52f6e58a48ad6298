mod common;

use common::{balance, bank_with_card, count, date, engine_with_db};
use engine::{CardKind, CreateTransactionCmd, EngineError, NewCardCmd, TransactionKind, TransferCmd};
use uuid::Uuid;

#[tokio::test]
async fn create_user_rejects_duplicates() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.create_user("alice", "other").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
    assert!(engine.user_exists("alice").await.unwrap());
    assert!(!engine.user_exists("carol").await.unwrap());
}

#[tokio::test]
async fn bank_names_are_unique_per_user_after_normalization() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine.create_bank("alice", "  Itaú  ", 0).await.unwrap();
    assert_eq!(bank.name, "Itaú");

    let err = engine.create_bank("alice", "ITAU", 0).await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Another user can reuse the name.
    engine.create_bank("bob", "Itau", 0).await.unwrap();

    let err = engine.create_bank("carol", "Itau", 0).await.unwrap_err();
    assert!(err.is_not_found());

    let other = engine.create_bank("alice", "Inter", 0).await.unwrap();
    let err = engine
        .rename_bank("alice", other.id, "itau")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let renamed = engine
        .rename_bank("alice", other.id, "Banco Inter")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Banco Inter");
    assert_eq!(renamed.opening_balance, 0);

    let names: Vec<String> = engine
        .list_banks("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|bank| bank.name)
        .collect();
    assert_eq!(names, vec!["Banco Inter".to_string(), "Itaú".to_string()]);
}

#[tokio::test]
async fn card_validation_and_ownership() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine.create_bank("alice", "Nubank", 0).await.unwrap();

    let err = engine
        .create_card(NewCardCmd::new("alice", bank.id, "Gold", CardKind::Credit).due_day(32))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));

    let err = engine
        .create_card(
            NewCardCmd::new("alice", bank.id, "Gold", CardKind::Credit).limit_minor(-1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_card(NewCardCmd::new("bob", bank.id, "Gold", CardKind::Credit))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let card = engine
        .create_card(
            NewCardCmd::new("alice", bank.id, "Gold", CardKind::Credit)
                .limit_minor(100_000)
                .due_day(31),
        )
        .await
        .unwrap();
    let stored = engine.card("alice", card.id).await.unwrap();
    assert_eq!(stored.kind, CardKind::Credit);
    assert_eq!(stored.limit_minor, Some(100_000));
    assert_eq!(stored.due_day, Some(31));
    assert!(engine.card("bob", card.id).await.unwrap_err().is_not_found());

    let updated = engine
        .update_card("alice", card.id, "Gold Plus", None, Some(5))
        .await
        .unwrap();
    assert_eq!(updated.name, "Gold Plus");
    assert_eq!(updated.limit_minor, None);
    assert_eq!(updated.due_day, Some(5));
    assert_eq!(updated.bank_id, bank.id);

    assert!(engine.list_cards("bob", None).await.unwrap().is_empty());
    assert_eq!(engine.list_cards("alice", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_card_reverses_paid_transactions() {
    let (engine, db) = engine_with_db().await;
    let (bank, card) = bank_with_card(&engine, "alice", "Nubank", 10_000, None).await;

    for (amount, paid) in [(1_000, true), (2_000, false)] {
        engine
            .create_transaction(
                CreateTransactionCmd::new(
                    "alice",
                    card.id,
                    TransactionKind::Expense,
                    amount,
                    "Stuff",
                    date(2024, 1, 1),
                )
                .paid(paid),
            )
            .await
            .unwrap();
    }
    assert_eq!(balance(&engine, "alice", &bank).await, 9_000);

    let deleted = engine.delete_card("alice", card.id).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(balance(&engine, "alice", &bank).await, 10_000);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM transactions").await, 0);
    assert!(engine.card("alice", card.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_bank_leaves_no_orphans() {
    let (engine, db) = engine_with_db().await;
    let (nubank, nu_card) = bank_with_card(&engine, "alice", "Nubank", 1_000, None).await;
    let (inter, _inter_card) = bank_with_card(&engine, "alice", "Inter", 1_000, None).await;
    engine
        .create_card(NewCardCmd::new("alice", nubank.id, "Extra", CardKind::Credit))
        .await
        .unwrap();
    engine
        .create_transaction(CreateTransactionCmd::new(
            "alice",
            nu_card.id,
            TransactionKind::Expense,
            100,
            "Lunch",
            date(2024, 1, 1),
        ))
        .await
        .unwrap();
    let pair = engine
        .create_transfer(TransferCmd::new(
            "alice",
            inter.id,
            nubank.id,
            300,
            date(2024, 1, 2),
            "Move",
        ))
        .await
        .unwrap();

    let deleted = engine.delete_bank("alice", nubank.id).await.unwrap();
    assert_eq!(deleted, 2);

    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM cards").await, 1);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM transactions t \
             LEFT JOIN cards c ON c.id = t.card_id WHERE c.id IS NULL",
        )
        .await,
        0
    );

    let outgoing = engine.transaction("alice", pair.outgoing.id).await.unwrap();
    assert_eq!(outgoing.transfer_to_bank_id, None);
    assert!(engine.bank("alice", nubank.id).await.unwrap_err().is_not_found());
    assert!(
        engine
            .delete_bank("alice", nubank.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn categories_default_color_and_delete_uncategorizes() {
    let (engine, _db) = engine_with_db().await;
    let (_bank, card) = bank_with_card(&engine, "alice", "Nubank", 0, None).await;

    let food = engine.create_category("alice", "Food", None).await.unwrap();
    assert_eq!(food.color, "#007bff");
    let err = engine
        .create_category("alice", " food ", Some("#FFF"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = engine
        .create_category("alice", "Travel", Some("blue"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let updated = engine
        .update_category("alice", food.id, None, Some("#ABCDEF"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Food");
    assert_eq!(updated.color, "#abcdef");

    let rows = engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                card.id,
                TransactionKind::Expense,
                500,
                "Pizza",
                date(2024, 1, 1),
            )
            .category(food.id),
        )
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                card.id,
                TransactionKind::Expense,
                500,
                "Pizza",
                date(2024, 1, 1),
            )
            .category(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(engine.delete_category("bob", food.id).await.unwrap_err().is_not_found());
    engine.delete_category("alice", food.id).await.unwrap();
    let tx = engine.transaction("alice", rows[0].id).await.unwrap();
    assert_eq!(tx.category_id, None);
    assert!(engine.list_categories("alice").await.unwrap().is_empty());
}
