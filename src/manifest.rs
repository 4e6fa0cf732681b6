use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::CaseId;
use crate::error::KiraError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestEntry {
    pub file_name: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub cases: Vec<ManifestCase>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestCase {
    pub case_id: String,
}

impl ManifestEntry {
    pub fn primary_case(&self) -> Option<&ManifestCase> {
        self.cases.first()
    }
}

pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, KiraError> {
    let content =
        fs::read_to_string(path).map_err(|_| KiraError::ManifestRead(path.to_path_buf()))?;
    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<Vec<ManifestEntry>, KiraError> {
    serde_json::from_str(content).map_err(|err| KiraError::ManifestParse(err.to_string()))
}

pub fn load_cohort(path: &Path, column: &str) -> Result<Vec<CaseId>, KiraError> {
    let file = fs::File::open(path)
        .map_err(|err| KiraError::CohortRead(format!("{}: {err}", path.display())))?;
    parse_cohort(file, column)
}

pub fn parse_cohort<R: Read>(reader: R, column: &str) -> Result<Vec<CaseId>, KiraError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|err| KiraError::CohortRead(err.to_string()))?;
    let index = headers
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| KiraError::CohortColumn(column.to_string()))?;

    let mut cases = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|err| KiraError::CohortRead(err.to_string()))?;
        match record.get(index) {
            Some(value) if !value.is_empty() => cases.push(value.parse()?),
            _ => continue,
        }
    }
    Ok(cases)
}
