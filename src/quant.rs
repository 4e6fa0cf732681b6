use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::domain::{CountType, GeneAnnotation};
use crate::error::KiraError;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "gene_id",
    "gene_name",
    "gene_type",
    "unstranded",
    "tpm_unstranded",
    "fpkm_unstranded",
    "fpkm_uq_unstranded",
];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuantificationRecord {
    pub gene_id: String,
    pub gene_name: String,
    pub gene_type: String,
    pub unstranded: Option<f64>,
    pub tpm_unstranded: Option<f64>,
    pub fpkm_unstranded: Option<f64>,
    pub fpkm_uq_unstranded: Option<f64>,
}

impl QuantificationRecord {
    pub fn count(&self, kind: CountType) -> Option<f64> {
        match kind {
            CountType::Unstranded => self.unstranded,
            CountType::TpmUnstranded => self.tpm_unstranded,
            CountType::FpkmUnstranded => self.fpkm_unstranded,
            CountType::FpkmUqUnstranded => self.fpkm_uq_unstranded,
        }
    }

    pub fn annotation(&self) -> GeneAnnotation {
        GeneAnnotation::new(&self.gene_id, &self.gene_name, &self.gene_type)
    }
}

#[derive(Debug, Clone)]
pub struct QuantificationTable {
    pub source_name: String,
    pub records: Vec<QuantificationRecord>,
}

impl QuantificationTable {
    pub fn values(&self, kind: CountType) -> impl Iterator<Item = (String, Option<f64>)> + '_ {
        self.records
            .iter()
            .map(move |record| (record.gene_id.clone(), record.count(kind)))
    }

    pub fn annotations(&self) -> impl Iterator<Item = GeneAnnotation> + '_ {
        self.records.iter().map(QuantificationRecord::annotation)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_quantification(path: &Path) -> Result<QuantificationTable, KiraError> {
    let bytes = fs::read(path)
        .map_err(|err| KiraError::Filesystem(format!("read {}: {err}", path.display())))?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_quantification_bytes(&bytes, &source_name)
}

pub fn parse_quantification_bytes(
    bytes: &[u8],
    source_name: &str,
) -> Result<QuantificationTable, KiraError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        parse_quantification(GzDecoder::new(bytes), source_name)
    } else {
        parse_quantification(bytes, source_name)
    }
}

pub fn parse_quantification<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<QuantificationTable, KiraError> {
    let parse_err = |err: csv::Error| KiraError::QuantificationParse {
        source_name: source_name.to_string(),
        message: err.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(parse_err)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|name| name == column) {
            return Err(KiraError::MissingColumn {
                source_name: source_name.to_string(),
                column: column.to_string(),
            });
        }
    }

    let records = rdr
        .deserialize::<QuantificationRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(parse_err)?;

    Ok(QuantificationTable {
        source_name: source_name.to_string(),
        records,
    })
}
