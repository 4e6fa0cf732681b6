use std::collections::HashSet;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::consolidate::{Consolidator, DriftEvent};
use crate::domain::{CaseId, CountType, MappingDedup};
use crate::error::KiraError;
use crate::gdc::GdcClient;
use crate::identity::CaseFileIndex;
use crate::manifest::{load_cohort, load_manifest};
use crate::output::{save_mapping, save_matrix};
use crate::quant::{load_quantification, parse_quantification_bytes};
use crate::store::RawStore;

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub generated_at: String,
    pub type_of_counts: CountType,
    pub mapping_dedup: MappingDedup,
    pub cases_processed: usize,
    pub gene_columns: usize,
    pub mapping_rows: usize,
    pub drift_events: Vec<DriftEvent>,
    pub mapping_conflicts: usize,
    pub missing_cases: Vec<String>,
    pub matrix_output: String,
    pub mapping_output: String,
    pub raw_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveResult {
    pub cases: Vec<ResolvedCase>,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCase {
    pub case_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub fn resolve_index(config: &ResolvedConfig) -> Result<CaseFileIndex, KiraError> {
    let manifest = load_manifest(config.manifest.as_std_path())?;
    let cohort = load_cohort(config.cohort.as_std_path(), &config.cohort_column)?;
    let index = CaseFileIndex::resolve(&manifest, &cohort)?;
    if index.is_empty() {
        tracing::warn!(
            manifest = %config.manifest,
            cohort = %config.cohort,
            "no cohort case has a file in the manifest"
        );
    }
    for case_id in index.unmatched() {
        tracing::warn!(
            case_id = case_id.as_str(),
            "cohort case has no file in the manifest"
        );
    }
    Ok(index)
}

pub fn resolve(config: &ResolvedConfig, sink: &dyn ProgressSink) -> Result<ResolveResult, KiraError> {
    sink.event(ProgressEvent {
        message: format!("phase=Resolve; joining {} with {}", config.manifest, config.cohort),
        elapsed: None,
    });
    let index = resolve_index(config)?;
    Ok(ResolveResult {
        cases: index
            .iter()
            .map(|(case_id, file_name)| ResolvedCase {
                case_id: case_id.to_string(),
                file_name: file_name.to_string(),
            })
            .collect(),
        unmatched: index.unmatched().iter().map(CaseId::to_string).collect(),
    })
}

pub fn merge_local(
    config: &ResolvedConfig,
    files: &[Utf8PathBuf],
    sink: &dyn ProgressSink,
) -> Result<BuildResult, KiraError> {
    let index = resolve_index(config)?;
    let mut consolidator = new_consolidator(config);
    let mut processed = HashSet::new();

    for path in files {
        let file_name = path
            .file_name()
            .ok_or_else(|| KiraError::Filesystem(format!("not a file: {path}")))?;
        let case_id = index
            .case_for(file_name)
            .ok_or_else(|| KiraError::UnknownFile(file_name.to_string()))?
            .clone();
        let start = Instant::now();
        let table = load_quantification(path.as_std_path())?;
        consolidator.add_case(case_id.clone(), &table)?;
        processed.insert(case_id.clone());
        sink.event(ProgressEvent {
            message: format!("phase=Merge; case {case_id} ({} genes)", table.len()),
            elapsed: Some(start.elapsed()),
        });
    }

    finish(config, &index, &processed, consolidator, sink)
}

#[derive(Clone)]
pub struct App<G: GdcClient> {
    gdc: G,
}

impl<G: GdcClient> App<G> {
    pub fn new(gdc: G) -> Self {
        Self { gdc }
    }

    pub fn build(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, KiraError> {
        sink.event(ProgressEvent {
            message: "phase=Resolve; joining manifest with cohort".to_string(),
            elapsed: None,
        });
        let index = resolve_index(config)?;

        sink.event(ProgressEvent {
            message: format!("gdc.files request files={}", index.len()),
            elapsed: None,
        });
        let start = Instant::now();
        let hits = self.gdc.query_files(&index.file_names())?;
        sink.event(ProgressEvent {
            message: format!("gdc.files response hits={}", hits.len()),
            elapsed: Some(start.elapsed()),
        });

        let raw_store = config.raw_dir.clone().map(RawStore::new);
        if let Some(store) = &raw_store {
            store.ensure_root()?;
            tracing::info!(raw_dir = %store.root(), "keeping raw quantification files");
        }

        let mut consolidator = new_consolidator(config);
        let mut processed = HashSet::new();
        let total = hits.len();
        for (position, hit) in hits.iter().enumerate() {
            let case_id = index
                .case_for(&hit.file_name)
                .ok_or_else(|| KiraError::UnknownFile(hit.file_name.clone()))?
                .clone();

            let start = Instant::now();
            let body = self.gdc.fetch_file(&hit.file_id)?;
            if let Some(store) = &raw_store {
                store.save(&hit.file_name, &body)?;
            }
            let table = parse_quantification_bytes(&body, &hit.file_name)?;
            let outcome = consolidator.add_case(case_id.clone(), &table)?;
            processed.insert(case_id.clone());

            sink.event(ProgressEvent {
                message: format!(
                    "phase=Merge; case {case_id} [{}/{total}] genes={} new={}",
                    position + 1,
                    outcome.genes,
                    outcome.new_gene_ids.len()
                ),
                elapsed: Some(start.elapsed()),
            });
        }

        finish(config, &index, &processed, consolidator, sink)
    }
}

fn new_consolidator(config: &ResolvedConfig) -> Consolidator {
    Consolidator::new(
        config.type_of_counts,
        &config.row_label,
        config.mapping_dedup,
    )
}

fn finish(
    config: &ResolvedConfig,
    index: &CaseFileIndex,
    processed: &HashSet<CaseId>,
    consolidator: Consolidator,
    sink: &dyn ProgressSink,
) -> Result<BuildResult, KiraError> {
    let mut missing_cases = index
        .unmatched()
        .iter()
        .map(CaseId::to_string)
        .collect::<Vec<_>>();
    for (case_id, file_name) in index.iter() {
        if !processed.contains(case_id) {
            tracing::warn!(
                case_id = case_id.as_str(),
                file_name,
                "cohort case was not processed"
            );
            missing_cases.push(case_id.to_string());
        }
    }

    sink.event(ProgressEvent {
        message: "phase=Store; writing matrix and mapping".to_string(),
        elapsed: None,
    });
    save_matrix(consolidator.matrix(), &config.matrix_output)?;
    save_mapping(consolidator.mapping(), &config.mapping_output)?;

    Ok(BuildResult {
        generated_at: chrono::Utc::now().to_rfc3339(),
        type_of_counts: consolidator.count_type(),
        mapping_dedup: consolidator.mapping().mode(),
        cases_processed: consolidator.matrix().n_rows(),
        gene_columns: consolidator.matrix().n_columns(),
        mapping_rows: consolidator.mapping().len(),
        drift_events: consolidator.drift_events().to_vec(),
        mapping_conflicts: consolidator.conflicts().len(),
        missing_cases,
        matrix_output: config.matrix_output.to_string(),
        mapping_output: config.mapping_output.to_string(),
        raw_dir: config.raw_dir.as_ref().map(|dir| dir.to_string()),
    })
}
