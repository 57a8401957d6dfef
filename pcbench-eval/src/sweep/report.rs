//! Report sink: one CSV row per evaluated frame, written in sweep order.

use pcbench_quality::QualityMetric;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Evaluated(QualityMetric),
    Skipped { kind: &'static str, message: String },
}

/// One report row, numbered by its position in the sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// `point_index * frame_count + frame_position`.
    pub sequence: usize,
    pub tag: String,
    pub frame: usize,
    pub outcome: RowOutcome,
}

/// CSV writer that flushes after every row.
pub struct ReportWriter<W: Write> {
    sink: W,
    rows_written: usize,
    skipped: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Wrap `sink` and write the header.
    pub fn new(mut sink: W) -> io::Result<Self> {
        QualityMetric::print_csv_header(&mut sink)?;
        sink.flush()?;
        Ok(Self {
            sink,
            rows_written: 0,
            skipped: 0,
        })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> io::Result<()> {
        match &row.outcome {
            RowOutcome::Evaluated(quality) => {
                quality.print_csv_line(&row.tag, row.frame, &mut self.sink)?;
                self.rows_written += 1;
            }
            RowOutcome::Skipped { kind, message } => {
                QualityMetric::print_csv_error_line(
                    &row.tag,
                    row.frame,
                    kind,
                    message,
                    &mut self.sink,
                )?;
                self.skipped += 1;
            }
        }
        self.sink.flush()
    }

    /// Rows with an evaluation result.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Reorders rows arriving from parallel workers back into sweep order.
#[derive(Debug, Default)]
pub struct OrderedRowBuffer {
    next: usize,
    pending: BTreeMap<usize, ReportRow>,
}

impl OrderedRowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a row and return every row that is now contiguous with those
    /// already released.
    pub fn push(&mut self, row: ReportRow) -> Vec<ReportRow> {
        self.pending.insert(row.sequence, row);
        let mut ready = Vec::new();
        while let Some(row) = self.pending.remove(&self.next) {
            ready.push(row);
            self.next += 1;
        }
        ready
    }

    /// Rows held back by a gap.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
