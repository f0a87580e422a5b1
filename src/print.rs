//! Print dispatch for kitchen tickets.
//!
//! The aggregation core never prints. A [`PrintDispatcher`] turns a finished
//! ticket into a [`PrintJob`] and hands it to the printer. The ESC/POS
//! dispatcher writes raw bytes to any `io::Write` sink: a device file, a TCP
//! stream to a network printer, or a buffer in tests.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PrintError;
use crate::receipt_renderer::{self, KitchenTicketDoc, LayoutConfig, RenderWarning};

#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub payload: Vec<u8>,
    pub warnings: Vec<RenderWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintAck {
    pub job_id: Uuid,
    pub bytes_written: usize,
}

pub trait PrintDispatcher {
    fn render(&self, ticket: &KitchenTicketDoc) -> PrintJob;
    fn submit(&mut self, job: PrintJob) -> Result<PrintAck, PrintError>;

    /// Render and submit in one step.
    fn print(&mut self, ticket: &KitchenTicketDoc) -> Result<PrintAck, PrintError> {
        let job = self.render(ticket);
        self.submit(job)
    }
}

pub struct EscPosDispatcher<W: Write> {
    sink: W,
    layout: LayoutConfig,
}

impl<W: Write> EscPosDispatcher<W> {
    pub fn new(sink: W, layout: LayoutConfig) -> Self {
        Self { sink, layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> PrintDispatcher for EscPosDispatcher<W> {
    fn render(&self, ticket: &KitchenTicketDoc) -> PrintJob {
        let rendered = receipt_renderer::render_escpos(ticket, &self.layout);
        PrintJob {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            payload: rendered.bytes,
            warnings: rendered.warnings,
        }
    }

    fn submit(&mut self, job: PrintJob) -> Result<PrintAck, PrintError> {
        if job.payload.is_empty() {
            return Err(PrintError::EmptyJob(job.id));
        }
        for warning in &job.warnings {
            warn!(job_id = %job.id, code = %warning.code, "{}", warning.message);
        }
        self.sink.write_all(&job.payload)?;
        self.sink.flush()?;
        info!(
            job_id = %job.id,
            bytes = job.payload.len(),
            "Kitchen ticket dispatched"
        );
        Ok(PrintAck {
            job_id: job.id,
            bytes_written: job.payload.len(),
        })
    }
}
