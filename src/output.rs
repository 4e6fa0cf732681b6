use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::{BuildResult, ProgressEvent, ProgressSink, ResolveResult};
use crate::error::KiraError;
use crate::mapping::GeneMapping;
use crate::matrix::ExpressionMatrix;
use crate::store::write_atomic;

pub const OUTPUT_DELIMITER: u8 = b';';

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub fn write_matrix<W: Write>(matrix: &ExpressionMatrix, writer: W) -> Result<(), KiraError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(writer);

    let mut header = Vec::with_capacity(matrix.n_columns() + 1);
    header.push(matrix.row_label());
    header.extend(matrix.columns().iter().map(String::as_str));
    wtr.write_record(&header)
        .map_err(|err| KiraError::Output(err.to_string()))?;

    for (case_id, row) in matrix.rows() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(case_id.to_string());
        record.extend(
            row.into_iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)
            .map_err(|err| KiraError::Output(err.to_string()))?;
    }
    wtr.flush().map_err(|err| KiraError::Output(err.to_string()))
}

pub fn write_mapping<W: Write>(mapping: &GeneMapping, writer: W) -> Result<(), KiraError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(writer);
    for row in mapping.rows() {
        wtr.serialize(row)
            .map_err(|err| KiraError::Output(err.to_string()))?;
    }
    if mapping.is_empty() {
        wtr.write_record(["gene_id", "gene_name", "gene_type"])
            .map_err(|err| KiraError::Output(err.to_string()))?;
    }
    wtr.flush().map_err(|err| KiraError::Output(err.to_string()))
}

pub fn save_matrix(matrix: &ExpressionMatrix, path: &Utf8Path) -> Result<(), KiraError> {
    write_atomic(path, |file| write_matrix(matrix, file))
}

pub fn save_mapping(mapping: &GeneMapping, path: &Utf8Path) -> Result<(), KiraError> {
    write_atomic(path, |file| write_mapping(mapping, file))
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_resolve(result: &ResolveResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => tracing::info!("{}", event.message),
        }
    }
}
