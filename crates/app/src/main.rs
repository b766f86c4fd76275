//! Rebate Application CLI

use std::{io, path::PathBuf, process};

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use rebate::fixtures::{self, CartFixture, CustomerFixture, DiscountsFixture};
use rebate_app::{
    database::Db, domain::coupons::CouponsService, offline::OfflineStore, receipt::write_quote,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rebate-app", about = "Rebate promotions CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(DbCommand),
    Quote(QuoteArgs),
}

#[derive(Debug, Args)]
struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Discounts fixture (YAML)
    #[arg(long)]
    discounts: PathBuf,

    /// Cart fixture (YAML)
    #[arg(long)]
    cart: PathBuf,

    /// Customer fixture (YAML); quotes for a guest when omitted
    #[arg(long)]
    customer: Option<PathBuf>,

    /// Quote as of this instant; defaults to now
    #[arg(long)]
    at: Option<Timestamp>,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Db(DbCommand {
            command: DbSubcommand::Migrate(args),
        }) => migrate(args).await,
        Commands::Quote(args) => quote(args).await,
    }
}

async fn migrate(args: MigrateArgs) -> Result<(), String> {
    let db = Db::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    db.migrate()
        .await
        .map_err(|error| format!("failed to apply migrations: {error}"))?;

    println!("migrations applied");

    Ok(())
}

async fn quote(args: QuoteArgs) -> Result<(), String> {
    let discounts: DiscountsFixture = fixtures::load(&args.discounts)
        .map_err(|error| format!("failed to load discounts: {error}"))?;

    let cart: CartFixture =
        fixtures::load(&args.cart).map_err(|error| format!("failed to load cart: {error}"))?;

    let customer: Option<CustomerFixture> = args
        .customer
        .as_ref()
        .map(|path| fixtures::load(path))
        .transpose()
        .map_err(|error| format!("failed to load customer: {error}"))?;

    let offline = OfflineStore::load(discounts, &cart, customer.as_ref())
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    let quote = offline
        .context
        .coupons
        .quote_cart(offline.store, offline.cart, args.at.unwrap_or_else(Timestamp::now))
        .await
        .map_err(|error| format!("failed to quote cart: {error}"))?;

    write_quote(&mut io::stdout().lock(), &quote)
        .map_err(|error| format!("failed to print quote: {error}"))
}
