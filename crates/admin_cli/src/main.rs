use std::error::Error;

use clap::Parser;
use engine::{
    Bank, Card, CreateTransactionCmd, CreatedVia, DepositCmd, Engine, MoneyCents, NewCardCmd,
    SummaryFilter, Transaction, TransactionListFilter, TransferCmd, UpdateGroupCmd,
    UpdateTransactionCmd,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

use cli::{
    BankCommand, CardCommand, CategoryCommand, Cli, Command, FilterArgs, GroupCommand,
    StatusArg, SummaryCommand, TransactionCommand, UserCommand,
};

mod cli;
mod prompt;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn money(cents: i64) -> MoneyCents {
    MoneyCents::new(cents)
}

fn print_bank(bank: &Bank) {
    println!(
        "{}  {:<20} opening {:>12}  current {:>12}",
        bank.id,
        bank.name,
        money(bank.opening_balance),
        money(bank.current_balance)
    );
}

fn print_card(card: &Card) {
    let limit = card
        .limit_minor
        .map_or_else(|| "-".to_string(), |l| money(l).to_string());
    let due = card
        .due_day
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    println!(
        "{}  {:<20} {:<6} limit {:>12}  due {:>2}  bank {}",
        card.id,
        card.name,
        card.kind.as_str(),
        limit,
        due,
        card.bank_id
    );
}

fn print_transaction(tx: &Transaction) {
    println!(
        "{}  {}  {:<12} {:>12}  {}  {}",
        tx.id,
        tx.date,
        tx.kind.as_str(),
        money(tx.amount_minor),
        if tx.is_paid { "paid   " } else { "pending" },
        tx.description
    );
}

fn summary_filter(args: &FilterArgs) -> SummaryFilter {
    SummaryFilter {
        bank_id: args.bank,
        card_id: args.card,
        category_id: args.category,
        from: args.from,
        to: args.to,
        year: args.year,
        month: args.month,
    }
}

async fn run_user(engine: &Engine, command: UserCommand) -> CliResult<()> {
    match command {
        UserCommand::Create { username } => {
            if engine.user_exists(&username).await? {
                eprintln!("user already exists: {username}");
                std::process::exit(1);
            }
            let password = prompt::new_password()?;
            engine.create_user(&username, &password).await?;
            println!("created user: {username}");
        }
    }
    Ok(())
}

async fn run_bank(engine: &Engine, command: BankCommand) -> CliResult<()> {
    match command {
        BankCommand::Create {
            user,
            name,
            opening,
        } => {
            let bank = engine.create_bank(&user, &name, opening).await?;
            println!("created bank: {} ({})", bank.name, bank.id);
        }
        BankCommand::List(args) => {
            for bank in engine.list_banks(&args.user).await? {
                print_bank(&bank);
            }
        }
        BankCommand::Rename { user, id, name } => {
            let bank = engine.rename_bank(&user, id, &name).await?;
            print_bank(&bank);
        }
        BankCommand::Delete(args) => {
            let deleted = engine.delete_bank(&args.user, args.id).await?;
            println!("deleted bank {} and {deleted} transactions", args.id);
        }
    }
    Ok(())
}

async fn run_card(engine: &Engine, command: CardCommand) -> CliResult<()> {
    match command {
        CardCommand::Create {
            user,
            bank,
            name,
            kind,
            limit,
            due_day,
        } => {
            let mut cmd = NewCardCmd::new(user, bank, name, kind);
            if let Some(limit) = limit {
                cmd = cmd.limit_minor(limit);
            }
            if let Some(day) = due_day {
                cmd = cmd.due_day(day);
            }
            let card = engine.create_card(cmd).await?;
            println!("created card: {} ({})", card.name, card.id);
        }
        CardCommand::List { user, bank } => {
            for card in engine.list_cards(&user, bank).await? {
                print_card(&card);
            }
        }
        CardCommand::Update {
            user,
            id,
            name,
            limit,
            due_day,
        } => {
            let card = engine.update_card(&user, id, &name, limit, due_day).await?;
            print_card(&card);
        }
        CardCommand::Delete(args) => {
            let deleted = engine.delete_card(&args.user, args.id).await?;
            println!("deleted card {} and {deleted} transactions", args.id);
        }
    }
    Ok(())
}

async fn run_category(engine: &Engine, command: CategoryCommand) -> CliResult<()> {
    match command {
        CategoryCommand::Create { user, name, color } => {
            let category = engine
                .create_category(&user, &name, color.as_deref())
                .await?;
            println!("created category: {} ({})", category.name, category.id);
        }
        CategoryCommand::List(args) => {
            for category in engine.list_categories(&args.user).await? {
                println!("{}  {:<20} {}", category.id, category.name, category.color);
            }
        }
        CategoryCommand::Update {
            user,
            id,
            name,
            color,
        } => {
            let category = engine
                .update_category(&user, id, name.as_deref(), color.as_deref())
                .await?;
            println!("{}  {:<20} {}", category.id, category.name, category.color);
        }
        CategoryCommand::Delete(args) => {
            engine.delete_category(&args.user, args.id).await?;
            println!("deleted category {}", args.id);
        }
    }
    Ok(())
}

async fn run_transaction(engine: &Engine, command: TransactionCommand) -> CliResult<()> {
    match command {
        TransactionCommand::Create {
            user,
            card,
            kind,
            amount,
            description,
            date,
            category,
            installments,
            paid,
        } => {
            let mut cmd = CreateTransactionCmd::new(user, card, kind, amount, description, date)
                .paid(paid)
                .created_via(CreatedVia::Cli);
            if let Some(category) = category {
                cmd = cmd.category(category);
            }
            if let Some(total) = installments {
                cmd = cmd.installments(total);
            }
            for tx in engine.create_transaction(cmd).await? {
                print_transaction(&tx);
            }
        }
        TransactionCommand::Show(args) => {
            print_transaction(&engine.transaction(&args.user, args.id).await?);
        }
        TransactionCommand::Toggle(args) => {
            print_transaction(&engine.toggle_payment(&args.user, args.id).await?);
        }
        TransactionCommand::Bulk { user, status, ids } => {
            let paid = matches!(status, StatusArg::Paid);
            let updated = engine.bulk_update_status(&user, &ids, paid).await?;
            println!("{} transactions updated", updated.len());
        }
        TransactionCommand::MarkPrevious { user, before } => {
            let changed = engine.mark_previous_as_paid(&user, before).await?;
            println!("{changed} transactions marked as paid");
        }
        TransactionCommand::Transfer {
            user,
            from,
            to,
            amount,
            date,
            description,
        } => {
            let pair = engine
                .create_transfer(
                    TransferCmd::new(user, from, to, amount, date, description)
                        .created_via(CreatedVia::Cli),
                )
                .await?;
            println!("transfer group {}", pair.group_id);
            print_transaction(&pair.outgoing);
            print_transaction(&pair.incoming);
        }
        TransactionCommand::Deposit {
            user,
            bank,
            amount,
            date,
            description,
            category,
        } => {
            let mut cmd =
                DepositCmd::new(user, bank, amount, date, description).created_via(CreatedVia::Cli);
            if let Some(category) = category {
                cmd = cmd.category(category);
            }
            print_transaction(&engine.create_deposit(cmd).await?);
        }
        TransactionCommand::Update {
            user,
            id,
            amount,
            description,
            date,
            category,
            clear_category,
        } => {
            let mut cmd = UpdateTransactionCmd::new(user, id);
            if let Some(amount) = amount {
                cmd = cmd.amount_minor(amount);
            }
            if let Some(description) = description {
                cmd = cmd.description(description);
            }
            if let Some(date) = date {
                cmd = cmd.date(date);
            }
            if let Some(category) = category {
                cmd = cmd.category(category);
            } else if clear_category {
                cmd = cmd.clear_category();
            }
            print_transaction(&engine.update_transaction(cmd).await?);
        }
        TransactionCommand::Delete(args) => {
            engine.delete_transaction(&args.user, args.id).await?;
            println!("deleted transaction {}", args.id);
        }
        TransactionCommand::List {
            user,
            bank,
            card,
            category,
            status,
            from,
            to,
            limit,
            cursor,
        } => {
            let filter = TransactionListFilter {
                bank_id: bank,
                card_id: card,
                category_id: category,
                from,
                to,
                status: status.map(Into::into),
                ..Default::default()
            };
            let page = engine
                .list_transactions(&user, &filter, limit, cursor.as_deref())
                .await?;
            for tx in &page.items {
                print_transaction(tx);
            }
            if let Some(next) = page.next_cursor {
                println!("next cursor: {next}");
            }
        }
    }
    Ok(())
}

async fn run_group(engine: &Engine, command: GroupCommand) -> CliResult<()> {
    match command {
        GroupCommand::Show(args) => {
            for tx in engine.group(&args.user, args.id).await? {
                print_transaction(&tx);
            }
        }
        GroupCommand::Update {
            user,
            id,
            amount,
            description,
            purchase_date,
            installments,
            category,
        } => {
            let mut cmd =
                UpdateGroupCmd::new(user, id, amount, description, purchase_date, installments);
            if let Some(category) = category {
                cmd = cmd.category(category);
            }
            let created = engine.update_group(cmd).await?;
            println!("group {id} rewritten with {created} installments");
        }
        GroupCommand::Delete(args) => {
            let deleted = engine.delete_group(&args.user, args.id).await?;
            println!("deleted {deleted} transactions of group {}", args.id);
        }
    }
    Ok(())
}

async fn run_summary(engine: &Engine, command: SummaryCommand) -> CliResult<()> {
    match command {
        SummaryCommand::Banks(args) => {
            let summary = engine.bank_summary(&args.user).await?;
            for bank in &summary.banks {
                println!("{:<20} {:>12}", bank.name, money(bank.current_balance));
            }
            println!("{:<20} {:>12}", engine::TOTAL_ROW, money(summary.total_minor));
        }
        SummaryCommand::Expenses(args) => {
            for row in engine
                .expense_totals(&args.user, &summary_filter(&args))
                .await?
            {
                println!("{:<10} {:>12}", row.period, money(row.total_minor));
            }
        }
        SummaryCommand::Categories(args) => {
            for row in engine
                .category_totals(&args.user, &summary_filter(&args))
                .await?
            {
                println!("{:<20} {:>12}", row.name, money(row.total_minor));
            }
        }
        SummaryCommand::Cards(args) => {
            for row in engine
                .card_totals(&args.user, &summary_filter(&args))
                .await?
            {
                println!(
                    "{:<20} {:<20} {:>12}",
                    row.bank_name,
                    row.card_name,
                    money(row.total_minor)
                );
            }
        }
        SummaryCommand::Credit(args) => {
            for row in engine.credit_usage(&args.user).await? {
                println!(
                    "{:<20} limit {:>12}  used {:>12}  available {:>12}",
                    row.name,
                    money(row.limit_minor),
                    money(row.used_minor),
                    money(row.available_minor)
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(command) => run_user(&engine, command).await?,
        Command::Bank(command) => run_bank(&engine, command).await?,
        Command::Card(command) => run_card(&engine, command).await?,
        Command::Category(command) => run_category(&engine, command).await?,
        Command::Transaction(command) => run_transaction(&engine, command).await?,
        Command::Group(command) => run_group(&engine, command).await?,
        Command::Summary(command) => run_summary(&engine, command).await?,
        Command::Recompute(args) => {
            for bank in engine.recompute_balances(&args.user).await? {
                print_bank(&bank);
            }
        }
        Command::Settle { before } => {
            let changed = engine.settle_all_before(before).await?;
            println!("{changed} transactions marked as paid");
        }
    }

    Ok(())
}
