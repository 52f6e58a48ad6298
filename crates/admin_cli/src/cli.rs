use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{CardKind, MoneyCents, PaymentStatus, TransactionKind};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the ledger (users, banks, cards, transactions)")]
pub struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./ledger.db?mode=rwc"
    )]
    pub database_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Bank(BankCommand),
    #[command(subcommand)]
    Card(CardCommand),
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand, name = "tx")]
    Transaction(TransactionCommand),
    #[command(subcommand)]
    Group(GroupCommand),
    #[command(subcommand)]
    Summary(SummaryCommand),
    /// Rebuild stored bank balances from paid transactions.
    Recompute(OwnerArgs),
    /// Mark pending transactions due before a date as paid, for every user.
    Settle {
        #[arg(long)]
        before: NaiveDate,
    },
}

#[derive(Args, Debug)]
pub struct OwnerArgs {
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub id: Uuid,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user; the password is asked on the terminal.
    Create {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BankCommand {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_amount, default_value = "0", allow_hyphen_values = true)]
        opening: i64,
    },
    List(OwnerArgs),
    Rename {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
    },
    Delete(TargetArgs),
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        bank: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_card_kind, default_value = "credit")]
        kind: CardKind,
        #[arg(long, value_parser = parse_amount)]
        limit: Option<i64>,
        #[arg(long)]
        due_day: Option<u32>,
    },
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        bank: Option<Uuid>,
    },
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_amount)]
        limit: Option<i64>,
        #[arg(long)]
        due_day: Option<u32>,
    },
    Delete(TargetArgs),
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    List(OwnerArgs),
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete(TargetArgs),
}

#[derive(Subcommand, Debug)]
pub enum TransactionCommand {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        card: Uuid,
        #[arg(long, value_parser = parse_kind, default_value = "expense")]
        kind: TransactionKind,
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        description: String,
        /// Due date, or purchase date with `--installments`.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        category: Option<Uuid>,
        #[arg(long)]
        installments: Option<u32>,
        #[arg(long)]
        paid: bool,
    },
    Show(TargetArgs),
    Toggle(TargetArgs),
    /// Set the paid flag of many transactions at once.
    Bulk {
        #[arg(long)]
        user: String,
        #[arg(long, value_enum)]
        status: StatusArg,
        #[arg(long, num_args = 1.., required = true)]
        ids: Vec<Uuid>,
    },
    MarkPrevious {
        #[arg(long)]
        user: String,
        #[arg(long)]
        before: NaiveDate,
    },
    Transfer {
        #[arg(long)]
        user: String,
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        description: String,
    },
    Deposit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        bank: Uuid,
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<Uuid>,
    },
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_parser = parse_amount)]
        amount: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, conflicts_with = "clear_category")]
        category: Option<Uuid>,
        #[arg(long)]
        clear_category: bool,
    },
    Delete(TargetArgs),
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        bank: Option<Uuid>,
        #[arg(long)]
        card: Option<Uuid>,
        #[arg(long)]
        category: Option<Uuid>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    Show(TargetArgs),
    /// Rewrite every installment of a group.
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        purchase_date: NaiveDate,
        #[arg(long)]
        installments: u32,
        #[arg(long)]
        category: Option<Uuid>,
    },
    Delete(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub bank: Option<Uuid>,
    #[arg(long)]
    pub card: Option<Uuid>,
    #[arg(long)]
    pub category: Option<Uuid>,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub month: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum SummaryCommand {
    Banks(OwnerArgs),
    /// Expenses per month, or per day with both `--year` and `--month`.
    Expenses(FilterArgs),
    Categories(FilterArgs),
    Cards(FilterArgs),
    Credit(OwnerArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Paid,
    Pending,
}

impl From<StatusArg> for PaymentStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Paid => Self::Paid,
            StatusArg::Pending => Self::Pending,
        }
    }
}

fn parse_amount(raw: &str) -> Result<i64, String> {
    raw.parse::<MoneyCents>()
        .map(MoneyCents::cents)
        .map_err(|err| err.to_string())
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    TransactionKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_card_kind(raw: &str) -> Result<CardKind, String> {
    CardKind::try_from(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn amounts_are_parsed_as_cents() {
        assert_eq!(parse_amount("12.34"), Ok(1_234));
        assert_eq!(parse_amount("7"), Ok(700));
        assert!(parse_amount("1.234").is_err());
    }

    #[test]
    fn parses_transaction_create() {
        let cli = Cli::try_parse_from([
            "ledger_admin",
            "tx",
            "create",
            "--user",
            "alice",
            "--card",
            "6f1c1f0e-2c4b-4f3a-9d2e-0a1b2c3d4e5f",
            "--amount",
            "300.00",
            "--description",
            "TV",
            "--date",
            "2024-01-15",
            "--installments",
            "3",
        ])
        .unwrap();
        let Command::Transaction(TransactionCommand::Create {
            kind,
            amount,
            installments,
            paid,
            ..
        }) = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(kind, TransactionKind::Expense);
        assert_eq!(amount, 30_000);
        assert_eq!(installments, Some(3));
        assert!(!paid);
    }
}
