use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use invoice::cli::{
    handle_customer_command, handle_invoice_command, handle_product_command, CustomerCommands,
    InvoiceCommands, ProductCommands,
};
use invoice::config::{InvoicePaths, Settings};
use invoice::storage::init::{initialize_storage, needs_initialization};
use invoice::storage::{NumberAllocator, Storage};

#[derive(Parser)]
#[command(
    name = "invoice",
    version,
    about = "Personal invoicing with sequential per-year numbering",
    long_about = "invoice-cli keeps customers, products and invoices in plain JSON files, \
                  derives net and gross prices consistently, converts VAT to the home \
                  currency using NBP exchange rates and renders invoice documents."
)]
struct Cli {
    /// Use the local rate table instead of downloading NBP rates
    #[arg(long, global = true)]
    offline: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Product catalog commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Invoice commands
    #[command(subcommand, alias = "inv")]
    Invoice(InvoiceCommands),

    /// Initialize the data directory
    Init {
        /// Seller address line printed on documents (repeat for each line)
        #[arg(long = "seller")]
        seller: Vec<String>,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        -1
    } else {
        i8::try_from(cli.verbose).unwrap_or(i8::MAX)
    };
    invoice::logging::init(verbosity);

    // Initialize paths and settings
    let paths = InvoicePaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;

    match cli.command {
        Some(Commands::Customer(cmd)) => {
            let _session = open_session(&mut storage)?;
            handle_customer_command(&storage, cmd)?;
        }
        Some(Commands::Product(cmd)) => {
            let _session = open_session(&mut storage)?;
            handle_product_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Invoice(cmd)) => {
            let mut session = open_session(&mut storage)?;
            handle_invoice_command(&storage, &settings, &mut session, cli.offline, cmd)?;
        }
        Some(Commands::Init { seller }) => {
            println!("Initializing invoice-cli at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            if !seller.is_empty() {
                settings.seller = seller.join("\n");
            }
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next steps:");
            println!(
                "  invoice customer add ACME \"Acme Ltd\" --address \"Street 1\" --address \"City\""
            );
            println!("  invoice product add WEB \"Web hosting\"");
            println!("  invoice product price WEB {} 100", settings.home_currency);
            println!("  invoice invoice new --customer ACME WEB,1");
        }
        Some(Commands::Config) => {
            println!("invoice-cli Configuration");
            println!("=========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("State file:       {}", paths.state_file().display());
            println!("Output directory: {}", settings.output_dir(&paths).display());
            println!("Initialized:      {}", !needs_initialization(&paths));
            println!();
            println!("Settings:");
            println!("  Home currency:   {}", settings.home_currency);
            println!("  Default VAT:     {}%", settings.default_vat);
            println!("  Default grace:   {} days", settings.default_grace_days);
            println!("  Default unit:    {}", settings.default_unit);
            println!("  Invoice prefix:  {}", settings.invoice_prefix);
            println!("  Rate source:     {:?}", settings.rate_source);
            println!("  Rate look-back:  {} days", settings.rate_lookback_days);
        }
        None => {
            println!("invoice-cli - personal invoicing");
            println!();
            println!("Run 'invoice --help' for usage information.");
            println!("Run 'invoice init' to set up the data directory.");
        }
    }

    Ok(())
}

/// Lock the sequence state, then load the data files
///
/// The lock is held until the returned allocator is dropped, so no other
/// session can rewrite the data files between this load and our saves.
fn open_session(storage: &mut Storage) -> Result<NumberAllocator> {
    let allocator = storage.open_allocator()?;
    storage.load_all()?;
    Ok(allocator)
}
