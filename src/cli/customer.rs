//! Customer CLI commands

use clap::Subcommand;

use crate::display::{format_customer_details, format_customer_list};
use crate::error::InvoiceResult;
use crate::services::CustomerService;
use crate::storage::Storage;

/// Customer subcommands
#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a customer
    Add {
        /// Short code used on the command line, e.g. ACME
        code: String,
        /// Name printed on invoices
        short: String,
        /// Address line (repeat for each line)
        #[arg(short, long = "address", required = true)]
        address: Vec<String>,
        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List all customers
    List,
    /// Show customer details
    Show {
        /// Customer code
        code: String,
    },
    /// Delete a customer that has no invoices
    Delete {
        /// Customer code
        code: String,
    },
}

/// Handle a customer command
pub fn handle_customer_command(storage: &Storage, cmd: CustomerCommands) -> InvoiceResult<()> {
    let service = CustomerService::new(storage);

    match cmd {
        CustomerCommands::Add {
            code,
            short,
            address,
            email,
        } => {
            let customer = service.create(&code, &short, &address.join("\n"), email.as_deref())?;
            println!("Created customer: {}", customer);
        }
        CustomerCommands::List => {
            let customers = service.list()?;
            println!("{}", format_customer_list(&customers));
        }
        CustomerCommands::Show { code } => {
            let customer = service.require(&code)?;
            print!("{}", format_customer_details(&customer));
        }
        CustomerCommands::Delete { code } => {
            let customer = service.delete(&code)?;
            println!("Deleted customer: {}", customer);
        }
    }

    Ok(())
}
