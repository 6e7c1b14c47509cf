//! # Caja Entry Point
//!
//! Operator CLI over the cash workflows.
//!
//! ```text
//! caja balance --register mayor
//! caja close --register menor --value "150,000"
//! caja transfer --value 50000
//! caja position --date 2026-03-14
//! caja record-movement --kind egreso --value 12000 --reason "Pago domicilio"
//! caja product --code 7702057
//! caja sales --page 0 --search ana
//! caja sale --id 1042
//! caja invoice --sale 1042
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use drogueria_caja::commands::cart::scan_product;
use drogueria_caja::commands::cash::CashDesk;
use drogueria_caja::commands::checkout::load_client;
use drogueria_caja::commands::{movement, sales};
use drogueria_caja::{
    bootstrap, init_tracing, CacheOptions, CartSession, PosError, PosResult, TracingNotifier,
};
use drogueria_core::format::parse_formatted_amount;
use drogueria_core::validation::parse_business_date;
use drogueria_core::{CashRegisterKind, Money, MovementKind};
use drogueria_http::SaleBackend;

#[derive(Debug, Parser)]
#[command(name = "caja", version, about = "Droguería POS cash desk")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Current balance of a register
    Balance {
        #[arg(long, default_value = "mayor", value_parser = parse_register)]
        register: CashRegisterKind,
    },
    /// Status record of a register
    Status {
        #[arg(long, default_value = "mayor", value_parser = parse_register)]
        register: CashRegisterKind,
    },
    /// Closing history of a register
    History {
        #[arg(long, default_value = "mayor", value_parser = parse_register)]
        register: CashRegisterKind,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Close a register with the counted amount
    Close {
        #[arg(long, default_value = "mayor", value_parser = parse_register)]
        register: CashRegisterKind,
        #[arg(long, value_parser = parse_amount)]
        value: Money,
    },
    /// Move money from caja mayor to caja menor
    Transfer {
        #[arg(long, value_parser = parse_amount)]
        value: Money,
    },
    /// Daily position of caja menor
    Position {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Movements of a day
    Movements {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Record a manual income or expense
    RecordMovement {
        #[arg(long, value_parser = parse_kind)]
        kind: MovementKind,
        #[arg(long, value_parser = parse_amount)]
        value: Money,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Delete a movement
    DeleteMovement {
        #[arg(long)]
        id: i64,
    },
    /// Provisional id of the next sale
    NextSaleId,
    /// Units of sale of a product code
    Product {
        #[arg(long)]
        code: String,
    },
    /// Client registered under a cédula
    Client {
        #[arg(long)]
        id: String,
    },
    /// Completed sales, one page at a time
    Sales {
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Keep only sales whose id, client or total contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Lines and payment of a saved sale
    Sale {
        #[arg(long)]
        id: i64,
    },
    /// Request the electronic invoice of a saved sale
    Invoice {
        #[arg(long)]
        sale: i64,
    },
    /// Issued electronic invoices
    Invoices {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

fn parse_register(raw: &str) -> Result<CashRegisterKind, String> {
    raw.parse().map_err(|e: drogueria_core::ValidationError| e.to_string())
}

fn parse_kind(raw: &str) -> Result<MovementKind, String> {
    raw.parse().map_err(|e: drogueria_core::ValidationError| e.to_string())
}

fn parse_amount(raw: &str) -> Result<Money, String> {
    let amount = parse_formatted_amount(raw);
    if amount.is_zero() && !raw.chars().any(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not an amount", raw));
    }
    Ok(amount)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_business_date(raw).map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> PosResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PosError::new(drogueria_caja::ErrorCode::Internal, e.to_string()))?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            eprintln!("{}", err.message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> PosResult<()> {
    let (config, session, api) = bootstrap(cli.config)?;
    let notifier = TracingNotifier;
    let today = Local::now().date_naive();
    let mut desk = CashDesk::new(&api, &notifier, &session);

    match cli.command {
        Command::Balance { register } => {
            let balance = desk.refresh_balance(register).await;
            println!("{}: {}", register, balance);
        }
        Command::Status { register } => {
            print_json(&desk.status(register).await)?;
        }
        Command::History {
            register,
            page,
            size,
        } => {
            print_json(&desk.history(register, page, size).await)?;
        }
        Command::Close { register, value } => {
            desk.close(register, value).await?;
            println!("{}: {}", register, desk.register(register).balance);
        }
        Command::Transfer { value } => {
            desk.refresh_balance(CashRegisterKind::Major).await;
            desk.transfer_major_to_minor(value).await?;
        }
        Command::Position { date } => {
            let position = desk.load_position(date.unwrap_or(today)).await.clone();
            print_json(&position)?;
            if let Some(preview) = desk.closing_preview() {
                println!("Closing preview: {}", preview);
            }
        }
        Command::Movements { date } => {
            let movements = movement::list_for_date(&api, &notifier, date.unwrap_or(today)).await;
            print_json(&movements)?;
        }
        Command::RecordMovement {
            kind,
            value,
            reason,
        } => {
            movement::create(&api, &session, &notifier, value, kind, &reason).await?;
        }
        Command::DeleteMovement { id } => {
            movement::delete(&api, &session, &notifier, id).await?;
        }
        Command::NextSaleId => {
            let id = api.next_sale_id().await?;
            println!("{}", id);
        }
        Command::Product { code } => {
            let mut cart = CartSession::new(&session, CacheOptions::from_config(&config));
            scan_product(&mut cart, &api, &notifier, &code).await?;
            if let Some(catalog) = cart.catalog() {
                println!("{} {}", catalog.product_code(), catalog.product_name());
                print_json(&catalog.units())?;
            }
        }
        Command::Client { id } => {
            let mut cart = CartSession::new(&session, CacheOptions::from_config(&config));
            print_json(&load_client(&mut cart, &api, &id).await?)?;
        }
        Command::Sales { page, search } => {
            let listed = sales::completed_sales(&api, &notifier, page).await;
            match search {
                Some(query) => print_json(&sales::search(&listed, &query))?,
                None => print_json(&listed)?,
            }
        }
        Command::Sale { id } => {
            print_json(&sales::sale_detail(&api, &notifier, id).await?)?;
        }
        Command::Invoice { sale } => {
            let now = Local::now().naive_local();
            sales::issue_electronic_invoice(&api, &session, &notifier, sale, now).await?;
        }
        Command::Invoices { page } => {
            print_json(&sales::electronic_invoices(&api, &notifier, page).await)?;
        }
    }

    Ok(())
}
