use std::io::Write;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV row sink for VWAP output.
///
/// Wraps a caller-supplied byte stream; rows are appended in emission order
/// and nothing is flushed until [`RowWriter::flush`].
pub struct RowWriter<W: Write> {
    out: csv::Writer<W>,
}

impl<W: Write> RowWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            out: csv::WriterBuilder::new().has_headers(false).from_writer(sink),
        }
    }

    pub fn header(&mut self) -> Result<(), OutputError> {
        self.out
            .write_record(["STOCK_SYMBOL", "STOCK_ID", "HOUR_AFTER_MIDNIGHT", "VWAP"])?;
        Ok(())
    }

    /// One output row. The VWAP is fixed to four decimals, matching the
    /// wire price precision.
    pub fn row(&mut self, symbol: &str, stock_id: u16, hour: u8, vwap: f64) -> Result<(), OutputError> {
        self.out.write_record([
            symbol,
            &stock_id.to_string(),
            &hour.to_string(),
            &format!("{vwap:.4}"),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.out.flush()?;
        Ok(())
    }
}
