use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfwise_core::{
    AppConfig, BookRecord, BookUpdate, CatalogRepository, Category, ExitCode, LendingService,
    LoanLedger, LoanRecord, RecordStore, Repository, ShelfwiseError,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "shelfwise",
    about = "Catalog and lending ledger for a small library",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting SHELFWISE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the catalog.
    Add {
        #[arg(long)]
        id: i32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        quantity: u32,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        rack: i32,
        /// One of: Computer, Electronics, Electrical, Civil, Mechanical.
        #[arg(long)]
        category: Category,
    },

    /// Show a single book.
    Get { id: i32 },

    /// Find books by exact name (case-insensitive).
    Find { name: String },

    /// List the catalog in stored order.
    List {
        #[arg(long)]
        category: Option<Category>,
    },

    /// Edit a book. Omitted fields keep their current value.
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        rack: Option<i32>,
        #[arg(long)]
        category: Option<Category>,
    },

    /// Delete a book from the catalog.
    Delete {
        id: i32,
        #[arg(long)]
        confirm: bool,
    },

    /// Lend a copy to a student.
    Issue {
        id: i32,
        #[arg(long)]
        student: String,
        /// Loan period in days (defaults to lending.loan_period_days).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Take back a lent copy.
    Return { id: i32 },

    /// List books currently on loan.
    Loans {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        overdue: bool,
    },

    /// List the available categories.
    Categories,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective config values.
    List,
    /// Print the config file location.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("SHELFWISE_JSON").as_deref() == Ok("1");

    let mut config = AppConfig::load()?;
    if let Ok(dir) = std::env::var("SHELFWISE_DATA_DIR") {
        config.set_data_dir(dir.into());
    }

    init_tracing(&config);

    match run(cli.command, &config, json_output) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<ShelfwiseError>() {
            Some(domain) => {
                tracing::debug!(error = ?domain, "command failed");
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "error",
                        "error": error_kind(domain),
                        "message": domain.to_string(),
                    }))?;
                } else {
                    eprintln!("{domain}");
                }
                std::process::exit(domain.exit_code() as i32);
            }
            None => Err(err),
        },
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("shelfwise_core={0},shelfwise={0}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Commands, config: &AppConfig, json_output: bool) -> Result<()> {
    let lending = LendingService::from_config(config);
    let catalog = lending.catalog();
    let ledger = lending.ledger();

    match command {
        Commands::Add { id, name, author, quantity, price, rack, category } => {
            let book = BookRecord::new(id, name, author, quantity, price, rack, category);
            catalog.add(book.clone())?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":book}))?;
            } else {
                println!("The record is successfully saved: {} ({})", book.name, book.id);
            }
        }

        Commands::Get { id } => {
            let book = catalog.get(id)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":book}))?;
            } else {
                print_books(&[book]);
            }
        }

        Commands::Find { name } => {
            let books = catalog.find_by_name(&name)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"items":books,"total":books.len(),"query":name}}))?;
            } else if books.is_empty() {
                println!("No record found for: {name}");
            } else {
                print_books(&books);
            }
        }

        Commands::List { category } => {
            let (books, copies) = catalog_listing(catalog, category)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"items":books,"total_copies":copies}}))?;
            } else if books.is_empty() {
                println!("The library is empty. Use `shelfwise add` to add books.");
            } else {
                print_books(&books);
                println!("Total books = {copies}");
            }
        }

        Commands::Update { id, name, author, quantity, price, rack, category } => {
            let diff = BookUpdate { name, author, quantity, price, rack_no: rack, category };
            let book = catalog.update(id, &diff)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":book}))?;
            } else {
                println!("The record has been modified: {}", book.name);
            }
        }

        Commands::Delete { id, confirm } => {
            if !confirm {
                eprintln!("Add --confirm to delete book {id}.");
                std::process::exit(ExitCode::ConfirmRequired as i32);
            }
            let removed = catalog.remove(id)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"deleted":removed}}))?;
            } else {
                println!("Deleted book: {} ({id})", removed.name);
            }
        }

        Commands::Issue { id, student, days } => {
            let period = days.unwrap_or(lending.loan_period_days());
            let loan = lending.issue(id, &student, period)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":loan}))?;
            } else {
                println!("Book issued to {}.", loan.student_name);
                println!("To be returned by: {}", loan.due_date.format("%d-%m-%Y"));
            }
        }

        Commands::Return { id } => {
            let outcome = lending.return_book(id)?;
            if json_output {
                print_json(&serde_json::json!({
                    "status":"ok",
                    "data":{"loan":outcome.loan,"book":outcome.book}
                }))?;
            } else {
                println!("Book {id} returned by {}.", outcome.loan.student_name);
                if outcome.book.is_none() {
                    println!("Note: book {id} is no longer in the catalog; quantity not restored.");
                }
            }
        }

        Commands::Loans { student, overdue } => {
            let today = chrono::Local::now().date_naive();
            let loans = select_loans(ledger, student.as_deref(), overdue, today)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"items":loans,"total":loans.len()}}))?;
            } else if loans.is_empty() {
                println!("No books are currently issued.");
            } else {
                print_loans(&loans, today);
            }
        }

        Commands::Categories => {
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":Category::ALL}))?;
            } else {
                for (i, c) in Category::ALL.iter().enumerate() {
                    println!("{}. {c}", i + 1);
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::List => {
                let kv = config_key_values(config);
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":kv}))?;
                } else {
                    for (k, v) in &kv {
                        println!("{k} = {v}");
                    }
                }
            }
            ConfigAction::Path => println!("{}", AppConfig::config_path().display()),
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Books to list plus the number of copies they hold.
fn catalog_listing<S: RecordStore<BookRecord>>(
    catalog: &CatalogRepository<S>,
    category: Option<Category>,
) -> shelfwise_core::Result<(Vec<BookRecord>, u64)> {
    match category {
        Some(c) => {
            let books = catalog.list_by_category(c)?;
            let copies = books.iter().map(|b| u64::from(b.quantity)).sum();
            Ok((books, copies))
        }
        None => Ok((catalog.list_all()?, catalog.total_copies()?)),
    }
}

fn select_loans<S: RecordStore<LoanRecord>>(
    ledger: &LoanLedger<S>,
    student: Option<&str>,
    overdue: bool,
    today: chrono::NaiveDate,
) -> shelfwise_core::Result<Vec<LoanRecord>> {
    match student {
        None if overdue => ledger.list_overdue(today),
        None => ledger.list_all(),
        Some(s) => {
            let mut loans = ledger.list_for_student(s)?;
            if overdue {
                loans.retain(|l| l.is_overdue(today));
            }
            Ok(loans)
        }
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_books(books: &[BookRecord]) {
    println!(
        "{:<15} {:<7} {:<20} {:<20} {:<7} {:<10} {:<7}",
        "CATEGORY", "ID", "BOOK NAME", "AUTHOR", "QTY", "PRICE", "RACK NO"
    );
    for b in books {
        println!(
            "{:<15} {:<7} {:<20} {:<20} {:<7} {:<10.2} {:<7}",
            b.category.as_str(),
            b.id,
            b.name,
            b.author,
            b.quantity,
            b.price,
            b.rack_no
        );
    }
}

fn print_loans(loans: &[LoanRecord], today: chrono::NaiveDate) {
    println!(
        "{:<20} {:<15} {:<7} {:<20} {:<15} {:<15}",
        "STUDENT NAME", "CATEGORY", "ID", "BOOK NAME", "ISSUED DATE", "RETURN DATE"
    );
    for l in loans {
        let marker = if l.is_overdue(today) { "  (overdue)" } else { "" };
        println!(
            "{:<20} {:<15} {:<7} {:<20} {:<15} {:<15}{marker}",
            l.student_name,
            l.book.category.as_str(),
            l.id(),
            l.book.name,
            l.issued_date.format("%d-%m-%Y").to_string(),
            l.due_date.format("%d-%m-%Y").to_string(),
        );
    }
}

fn error_kind(err: &ShelfwiseError) -> &'static str {
    match err {
        ShelfwiseError::BookNotFound(_) | ShelfwiseError::LoanNotFound(_) => "not_found",
        ShelfwiseError::DuplicateId(_) => "duplicate_id",
        ShelfwiseError::NegativeQuantity { .. } => "negative_quantity",
        ShelfwiseError::OutOfStock(_) => "out_of_stock",
        ShelfwiseError::Validation(_) => "invalid",
        ShelfwiseError::StorageRead { .. } => "storage_read",
        ShelfwiseError::StorageWrite { .. } | ShelfwiseError::Io(_) => "storage_write",
        ShelfwiseError::Config(_)
        | ShelfwiseError::TomlParse(_)
        | ShelfwiseError::TomlSerialize(_) => "config",
    }
}

fn config_key_values(config: &AppConfig) -> std::collections::BTreeMap<&'static str, String> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("data_dir", config.data_dir().to_string_lossy().to_string());
    map.insert("book_file", config.book_file_path().to_string_lossy().to_string());
    map.insert("loan_file", config.loan_file_path().to_string_lossy().to_string());
    map.insert("loan_period_days", config.lending.loan_period_days.to_string());
    map.insert("logging.level", config.logging.level.clone());
    map
}
