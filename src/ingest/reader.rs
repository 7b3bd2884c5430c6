//! Lazy line-by-line reader over a snapshot stream.

use std::io::{BufRead, Lines};

use super::record::{parse_line, IngestStats, LineOutcome, RangeRecord};
use super::{IngestError, IngestOptions};

/// Iterator of validated records over any [`BufRead`].
///
/// Sentinel and filtered lines are skipped and counted in [`IngestStats`].
/// Single pass; once drained it stays empty.
pub struct RecordReader<R> {
    lines: Lines<R>,
    options: IngestOptions,
    line_no: usize,
    stats: IngestStats,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, options: IngestOptions) -> Self {
        Self {
            lines: reader.lines(),
            options,
            line_no: 0,
            stats: IngestStats::default(),
        }
    }

    /// Counters for the lines consumed so far
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<RangeRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(IngestError::Io {
                        line: self.line_no,
                        source,
                    }))
                }
            };

            let outcome = match parse_line(self.line_no, &line, &self.options) {
                Ok(outcome) => outcome,
                Err(e) => return Some(Err(e)),
            };
            self.stats.count(&outcome);
            if let LineOutcome::Record(record) = outcome {
                return Some(Ok(record));
            }
        }
    }
}
