//! Kitchen ticket core.
//!
//! Turns a restaurant order into what the kitchen prints: line items merged
//! into receipt rows, plus per-category prep totals (sauces, drinks, add-ons
//! and so on) across the whole order. Both passes are pure functions over the
//! order's items; rendering and printing sit on top as separate collaborators.

use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod aggregate;
pub mod config;
pub mod error;
pub mod escpos;
pub mod order;
pub mod print;
pub mod receipt_renderer;

pub use aggregate::{
    merge_line_items, merge_line_items_with, summarize_customizations, summarize_with,
    CategorySummary, MalformedAction, MergeKey, MergePolicy, PriceStrategy, SummaryCategory,
    SummaryOptions, SummaryReport, Tally,
};
pub use config::KitchenConfig;
pub use error::{ConfigError, OrderError, PrintError};
pub use order::{
    CustomerInfo, LineItem, MenuItem, NamedSelection, Order, OrderRecord, OrderType,
    PersistedOrder, Quantity,
};
pub use print::{EscPosDispatcher, PrintAck, PrintDispatcher, PrintJob};
pub use receipt_renderer::{
    build_kitchen_ticket_doc, render_escpos, render_text, KitchenTicketDoc, LayoutConfig,
    ReceiptTemplate,
};

const DEFAULT_LOG_FILTER: &str = "info,kitchen_ticket=debug";
const LOG_FILE_PREFIX: &str = "kitchen-ticket";

/// Install structured logging: console, plus a daily rolling file when
/// `log_dir` is given. `RUST_LOG` overrides the default filter.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        info!("Starting kitchen-ticket v{}", env!("CARGO_PKG_VERSION"));
    }
    guard
}
