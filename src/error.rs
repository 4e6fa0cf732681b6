use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid case id: {0:?}")]
    InvalidCaseId(String),

    #[error("invalid count type: {0}")]
    InvalidCountType(String),

    #[error("invalid mapping dedup mode: {0}")]
    InvalidDedupMode(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read manifest at {0}")]
    ManifestRead(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("invalid manifest entry: {0}")]
    InvalidManifest(String),

    #[error("failed to read cohort list: {0}")]
    CohortRead(String),

    #[error("cohort list has no column named {0:?}")]
    CohortColumn(String),

    #[error("file name {file_name} is shared by cases {first} and {second}")]
    #[diagnostic(help("each file in the manifest must belong to exactly one cohort case"))]
    IdentityCollision {
        file_name: String,
        first: String,
        second: String,
    },

    #[error("case {case_id} is linked to files {first} and {second}")]
    #[diagnostic(help("each cohort case must resolve to exactly one quantification file"))]
    CaseCollision {
        case_id: String,
        first: String,
        second: String,
    },

    #[error("repository returned file {0} which is not part of the cohort")]
    UnknownFile(String),

    #[error("case {0} was already added to the expression matrix")]
    DuplicateCase(String),

    #[error("gene id {gene_id} appears more than once in table for case {case_id}")]
    DuplicateGeneId { case_id: String, gene_id: String },

    #[error("quantification table {source_name} is missing column {column}")]
    MissingColumn { source_name: String, column: String },

    #[error("failed to parse quantification table {source_name}: {message}")]
    QuantificationParse {
        source_name: String,
        message: String,
    },

    #[error("GDC request failed: {0}")]
    GdcHttp(String),

    #[error("GDC returned status {status}: {message}")]
    GdcStatus { status: u16, message: String },

    #[error("unexpected GDC response: {0}")]
    GdcResponse(String),

    #[error("failed to write output: {0}")]
    Output(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
