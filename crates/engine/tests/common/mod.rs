#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Bank, Card, CardKind, Engine, NewCardCmd};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.create_user("alice", "password").await.unwrap();
    engine.create_user("bob", "password").await.unwrap();
    (engine, db)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn bank_with_card(
    engine: &Engine,
    user: &str,
    bank_name: &str,
    opening_balance: i64,
    due_day: Option<u32>,
) -> (Bank, Card) {
    let bank = engine
        .create_bank(user, bank_name, opening_balance)
        .await
        .unwrap();
    let mut cmd = NewCardCmd::new(user, bank.id, format!("{bank_name} card"), CardKind::Debit);
    if let Some(day) = due_day {
        cmd = cmd.due_day(day);
    }
    let card = engine.create_card(cmd).await.unwrap();
    (bank, card)
}

pub async fn balance(engine: &Engine, user: &str, bank: &Bank) -> i64 {
    engine.bank(user, bank.id).await.unwrap().current_balance
}

pub async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(backend, sql.to_string()))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}
