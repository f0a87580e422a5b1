use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kitchen_ticket::{
    build_kitchen_ticket_doc, init_logging, merge_line_items_with, render_text, summarize_with,
    EscPosDispatcher, KitchenConfig, OrderRecord, PrintDispatcher,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_SHA"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TicketFormat {
    Text,
    Escpos,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "kitchen-ticket",
    version,
    long_version = LONG_VERSION,
    about = "Merge order items and print kitchen tickets"
)]
struct Args {
    /// JSON config file (merge policy, summary options, layout)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print merged receipt rows as JSON
    Merge {
        /// Order JSON file, or - for stdin
        order: PathBuf,
    },
    /// Print the prep summary and any data-quality warnings as JSON
    Summary {
        /// Order JSON file, or - for stdin
        order: PathBuf,
    },
    /// Render the kitchen ticket
    Ticket {
        /// Order JSON file, or - for stdin
        order: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: TicketFormat,

        /// Id to print for a draft order that has no id yet
        #[arg(long)]
        order_id: Option<String>,

        /// Write output here instead of stdout (e.g. a printer device)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn read_order(path: &Path) -> Result<OrderRecord> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("read order from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read order {}", path.display()))?
    };
    OrderRecord::from_json_str(&raw).with_context(|| format!("parse order {}", path.display()))
}

fn open_output(out: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("open output {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());
    let cfg = KitchenConfig::load(args.config.as_deref()).context("load config")?;

    match args.command {
        Command::Merge { order } => {
            let record = read_order(&order)?;
            let rows = merge_line_items_with(&record.order().items, &cfg.merge)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Summary { order } => {
            let record = read_order(&order)?;
            let report = summarize_with(&record.order().items, &cfg.summary);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Ticket {
            order,
            format,
            order_id,
            out,
        } => {
            let record = read_order(&order)?;
            let doc = build_kitchen_ticket_doc(&record, order_id.as_deref(), &cfg)?;
            let mut sink = open_output(out.as_deref())?;
            match format {
                TicketFormat::Text => {
                    sink.write_all(render_text(&doc, &cfg.layout).as_bytes())?;
                    sink.flush()?;
                }
                TicketFormat::Json => {
                    serde_json::to_writer_pretty(&mut sink, &doc)?;
                    writeln!(sink)?;
                }
                TicketFormat::Escpos => {
                    let mut dispatcher = EscPosDispatcher::new(sink, cfg.layout.clone());
                    dispatcher.print(&doc)?;
                }
            }
        }
    }
    Ok(())
}
