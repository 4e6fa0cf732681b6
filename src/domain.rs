use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    #[default]
    #[value(name = "unstranded")]
    Unstranded,
    #[value(name = "tpm_unstranded")]
    TpmUnstranded,
    #[value(name = "fpkm_unstranded")]
    FpkmUnstranded,
    #[value(name = "fpkm_uq_unstranded")]
    FpkmUqUnstranded,
}

impl CountType {
    pub const ALL: [CountType; 4] = [
        CountType::Unstranded,
        CountType::TpmUnstranded,
        CountType::FpkmUnstranded,
        CountType::FpkmUqUnstranded,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            CountType::Unstranded => "unstranded",
            CountType::TpmUnstranded => "tpm_unstranded",
            CountType::FpkmUnstranded => "fpkm_unstranded",
            CountType::FpkmUqUnstranded => "fpkm_uq_unstranded",
        }
    }
}

impl fmt::Display for CountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for CountType {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        CountType::ALL
            .into_iter()
            .find(|kind| kind.column() == normalized)
            .ok_or_else(|| KiraError::InvalidCountType(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MappingDedup {
    #[default]
    Triple,
    GeneId,
}

impl fmt::Display for MappingDedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingDedup::Triple => write!(f, "triple"),
            MappingDedup::GeneId => write!(f, "gene-id"),
        }
    }
}

impl FromStr for MappingDedup {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "triple" => Ok(MappingDedup::Triple),
            "gene-id" | "gene_id" => Ok(MappingDedup::GeneId),
            _ => Err(KiraError::InvalidDedupMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseId(String);

impl CaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CaseId {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(KiraError::InvalidCaseId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

impl TryFrom<String> for CaseId {
    type Error = KiraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CaseId> for String {
    fn from(value: CaseId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneAnnotation {
    pub gene_id: String,
    pub gene_name: String,
    pub gene_type: String,
}

impl GeneAnnotation {
    pub fn new(
        gene_id: impl Into<String>,
        gene_name: impl Into<String>,
        gene_type: impl Into<String>,
    ) -> Self {
        Self {
            gene_id: gene_id.into(),
            gene_name: gene_name.into(),
            gene_type: gene_type.into(),
        }
    }
}
