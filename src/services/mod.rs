//! Service layer for invoice-cli
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, referential checks and invoice numbering.

pub mod customer;
pub mod invoice;
pub mod product;

pub use customer::CustomerService;
pub use invoice::{summarize, InvoiceDraft, InvoiceService, InvoiceSummary};
pub use product::ProductService;
