//! These structs provide the CLI interface for the fintrack CLI.

use crate::model::{Amount, TransactionType};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fintrack: browse and edit your monthly finances from the command line.
///
/// fintrack talks to a personal finance API. It lists the transactions of a month, filters them by
/// description, deletes and creates them, and shows the month's balance together with a few months
/// of history.
///
/// Start with `fintrack init --api-url <url>` and then `fintrack login`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass it as --home, by default it is $HOME/fintrack.
    Init(InitArgs),
    /// Remember who you are and the token used to call the API.
    Login(LoginArgs),
    /// Forget the signed-in user.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List the transactions of a month.
    Transactions(TransactionsArgs),
    /// Delete a transaction.
    Delete(DeleteArgs),
    /// Create a transaction.
    Create(CreateArgs),
    /// List the categories.
    Categories(CategoriesArgs),
    /// Show the balance of a month, its expenses by category and the recent history.
    Dashboard(DashboardArgs),
    /// Browse month by month interactively. Type `help` once it is running.
    Browse,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fintrack data and configuration is held. Defaults to ~/fintrack
    #[arg(long, env = "FINTRACK_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `fintrack init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the finance API, e.g. http://localhost:3333/api
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// (Not shown): Args for the `fintrack login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Your user id with the identity provider.
    #[arg(long)]
    uid: String,

    /// The bearer token sent with every API request.
    #[arg(long, env = "FINTRACK_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,
}

impl LoginArgs {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            token: token.into(),
            name: None,
            email: None,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Selects a month. Whatever is left out comes from today's date.
#[derive(Debug, Default, Parser, Clone)]
pub struct PeriodArgs {
    /// The month, 1 to 12. Defaults to the current month.
    #[arg(long)]
    month: Option<u32>,

    /// The year. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,
}

impl PeriodArgs {
    pub fn new(month: Option<u32>, year: Option<i32>) -> Self {
        Self { month, year }
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// (Not shown): Args for the `fintrack transactions` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct TransactionsArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Only show transactions whose description contains this text, ignoring case.
    #[arg(long)]
    search: Option<String>,

    /// Only fetch transactions of this category id.
    #[arg(long)]
    category: Option<String>,

    /// Only fetch transactions of this type: income or expense.
    #[arg(long = "type")]
    transaction_type: Option<TransactionType>,
}

impl TransactionsArgs {
    pub fn new(period: PeriodArgs, search: Option<String>) -> Self {
        Self {
            period,
            search,
            category: None,
            transaction_type: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn period(&self) -> &PeriodArgs {
        &self.period
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }
}

/// (Not shown): Args for the `fintrack delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the transaction to delete.
    id: String,

    /// Do not ask for confirmation.
    #[arg(long)]
    yes: bool,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>, yes: bool) -> Self {
        Self { id: id.into(), yes }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

/// (Not shown): Args for the `fintrack create` command.
#[derive(Debug, Parser, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    description: String,

    /// The amount, e.g. 12.50 or 12,50. It must be greater than zero.
    #[arg(long)]
    amount: Amount,

    /// The date, as YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    /// income or expense
    #[arg(long = "type", default_value_t = TransactionType::Expense)]
    transaction_type: TransactionType,

    /// The id of the category. It must have the same type as the transaction.
    #[arg(long)]
    category: String,
}

impl CreateArgs {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        date: NaiveDate,
        transaction_type: TransactionType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            transaction_type,
            category: category.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

/// (Not shown): Args for the `fintrack categories` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CategoriesArgs {
    /// Only show categories of this type: income or expense.
    #[arg(long = "type")]
    transaction_type: Option<TransactionType>,
}

impl CategoriesArgs {
    pub fn new(transaction_type: Option<TransactionType>) -> Self {
        Self { transaction_type }
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }
}

/// (Not shown): Args for the `fintrack dashboard` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DashboardArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// How many months of history to show, at most 120. Defaults to `history_months` in config.json.
    #[arg(long)]
    months: Option<u32>,
}

impl DashboardArgs {
    pub fn new(period: PeriodArgs, months: Option<u32>) -> Self {
        Self { period, months }
    }

    pub fn period(&self) -> &PeriodArgs {
        &self.period
    }

    pub fn months(&self) -> Option<u32> {
        self.months
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fintrack"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINTRACK_HOME instead of relying on the default \
                fintrack home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("fintrack")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
