// 🧭 Freedom Tracker CLI - thin front end over the library
//
//   freedom-tracker report
//   freedom-tracker accounts
//   freedom-tracker add-account <name> <institution> <type> <balance> [--primary]
//   freedom-tracker set-primary <account-id>
//   freedom-tracker connect <wallet-address>
//   freedom-tracker disconnect <wallet-address>
//   freedom-tracker export [path]
//   freedom-tracker import <path>
//   freedom-tracker reset --yes

use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use freedom_tracker::{
    backup, BankAccount, BankAccountType, ProfileStore, SqlitePersistence, TrackerConfig,
    WalletConnection,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("freedom_tracker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("report");

    let config = TrackerConfig::load().context("Failed to load configuration")?;
    let persistence = SqlitePersistence::open(&config.storage.db_path)?;
    let mut store = ProfileStore::open(Box::new(persistence), config)?;

    match command {
        "report" => run_report(&store),
        "accounts" => run_accounts(&store),
        "add-account" => run_add_account(&mut store, &args[2..]),
        "set-primary" => {
            let id = required(&args, 2, "account id")?;
            store.set_primary(id)?;
            println!("✓ {} is now the primary income account", id);
            Ok(())
        }
        "connect" => {
            let address = required(&args, 2, "wallet address")?;
            match store.connect_wallet(address)? {
                WalletConnection::Connected => println!("✓ Connected {}", address),
                WalletConnection::AlreadyConnected => {
                    println!("• {} was already connected", address)
                }
            }
            Ok(())
        }
        "disconnect" => {
            let address = required(&args, 2, "wallet address")?;
            let removed = store.disconnect_wallet(address)?;
            println!("✓ Disconnected {} ({} synced assets removed)", address, removed);
            Ok(())
        }
        "export" => {
            let path = args.get(2).map(String::as_str).unwrap_or("freedom-backup.json");
            backup::export_to_path(store.snapshot(), Path::new(path))?;
            println!("✓ Backup written to {}", path);
            Ok(())
        }
        "import" => {
            let path = required(&args, 2, "backup path")?;
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read backup from {}", path))?;
            store.import_backup(&text)?;
            println!("✓ Profile replaced from {}", path);
            run_report(&store)
        }
        "reset" => {
            if args.get(2).map(String::as_str) != Some("--yes") {
                bail!("reset erases the whole profile; re-run with --yes to confirm");
            }
            store.reset_store();
            println!("✓ Profile reset");
            Ok(())
        }
        other => bail!(
            "Unknown command '{}'. Try: report, accounts, add-account, set-primary, \
             connect, disconnect, export, import, reset",
            other
        ),
    }?;

    if let Some(err) = store.last_persistence_error() {
        eprintln!("⚠️  Changes are kept in memory but were not saved: {}", err);
    }

    Ok(())
}

fn required<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("Missing argument: {}", what))
}

fn run_report(store: &ProfileStore) -> Result<()> {
    let snapshot = store.snapshot();
    let report = store.freedom_report();

    println!("📊 Freedom Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Accounts:          {}", snapshot.bank_accounts.len());
    println!("Assets:            {}", snapshot.assets.len());
    println!("Wallets:           {}", snapshot.wallets.len());
    println!("Net worth:         ${:.2}", report.net_worth);
    println!("Annual income:     ${:.2}", report.annual_income);
    println!("Annual outflow:    ${:.2}", report.annual_outflow);
    println!("Asset income/day:  ${:.2}", report.daily_asset_income);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", report.summary());
    Ok(())
}

fn run_accounts(store: &ProfileStore) -> Result<()> {
    if store.bank_accounts().is_empty() {
        println!(
            "No bank accounts. Add one with: \
             freedom-tracker add-account <name> <institution> <type> <balance>"
        );
        return Ok(());
    }

    for account in store.bank_accounts() {
        println!(
            "{} {:<24} {:<16} {:<10} {:>12.2}  {}",
            if account.is_primary_income { "★" } else { " " },
            account.name,
            account.institution,
            account.account_type.as_str(),
            account.balance,
            account.id
        );
    }
    Ok(())
}

fn run_add_account(store: &mut ProfileStore, args: &[String]) -> Result<()> {
    if args.len() < 4 {
        bail!(
            "Usage: add-account <name> <institution> <checking|savings|investment> \
             <balance> [--primary]"
        );
    }

    let account_type = BankAccountType::parse(&args[2])
        .with_context(|| format!("Unknown account type '{}'", args[2]))?;
    let balance: f64 = args[3]
        .parse()
        .with_context(|| format!("Invalid balance '{}'", args[3]))?;
    let primary = args.iter().skip(4).any(|a| a == "--primary");

    let account = BankAccount::new(&args[0], &args[1], account_type, balance).with_primary(primary);
    let stored = store.add_bank_account(account)?;

    println!(
        "✓ Added {} ({}){}",
        stored.name,
        stored.id,
        if stored.is_primary_income { " as primary income account" } else { "" }
    );
    Ok(())
}
