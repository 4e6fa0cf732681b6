use serde::Serialize;

use crate::domain::{CaseId, CountType, MappingDedup};
use crate::error::KiraError;
use crate::mapping::{GeneMapping, MappingConflict};
use crate::matrix::ExpressionMatrix;
use crate::quant::QuantificationTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftEvent {
    pub case_id: String,
    pub new_gene_ids: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CaseOutcome {
    pub genes: usize,
    pub new_gene_ids: Vec<String>,
    pub conflicts: Vec<MappingConflict>,
}

#[derive(Debug, Clone)]
pub struct Consolidator {
    count_type: CountType,
    matrix: ExpressionMatrix,
    mapping: GeneMapping,
    drift_events: Vec<DriftEvent>,
    conflicts: Vec<MappingConflict>,
}

impl Consolidator {
    pub fn new(count_type: CountType, row_label: &str, dedup: MappingDedup) -> Self {
        Self {
            count_type,
            matrix: ExpressionMatrix::with_row_label(row_label),
            mapping: GeneMapping::new(dedup),
            drift_events: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn count_type(&self) -> CountType {
        self.count_type
    }

    // matrix first: a rejected table must not reach the mapping
    pub fn add_case(
        &mut self,
        case_id: CaseId,
        table: &QuantificationTable,
    ) -> Result<CaseOutcome, KiraError> {
        if table.is_empty() {
            tracing::warn!(
                case_id = case_id.as_str(),
                source = table.source_name.as_str(),
                "quantification table has no gene rows"
            );
        }
        let drift = self
            .matrix
            .append(case_id.clone(), table.values(self.count_type))?;

        let new_gene_ids = match drift {
            Some(drift) => {
                tracing::warn!(
                    case_id = case_id.as_str(),
                    source = table.source_name.as_str(),
                    new_gene_ids = drift.new_gene_ids.len(),
                    "{}",
                    drift.message()
                );
                self.drift_events.push(DriftEvent {
                    case_id: case_id.to_string(),
                    new_gene_ids: drift.new_gene_ids.len(),
                });
                drift.new_gene_ids
            }
            None => Vec::new(),
        };

        let conflicts = self.mapping.append(table.annotations());
        self.conflicts.extend(conflicts.iter().cloned());

        tracing::debug!(
            case_id = case_id.as_str(),
            genes = table.len(),
            columns = self.matrix.n_columns(),
            "case merged"
        );

        Ok(CaseOutcome {
            genes: table.len(),
            new_gene_ids,
            conflicts,
        })
    }

    pub fn matrix(&self) -> &ExpressionMatrix {
        &self.matrix
    }

    pub fn mapping(&self) -> &GeneMapping {
        &self.mapping
    }

    pub fn drift_events(&self) -> &[DriftEvent] {
        &self.drift_events
    }

    pub fn conflicts(&self) -> &[MappingConflict] {
        &self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tracing_test::traced_test;

    use super::*;
    use crate::quant::QuantificationRecord;

    fn table(source_name: &str, rows: &[(&str, &str, &str, f64)]) -> QuantificationTable {
        QuantificationTable {
            source_name: source_name.to_string(),
            records: rows
                .iter()
                .map(|(gene_id, gene_name, gene_type, value)| QuantificationRecord {
                    gene_id: gene_id.to_string(),
                    gene_name: gene_name.to_string(),
                    gene_type: gene_type.to_string(),
                    unstranded: Some(*value),
                    tpm_unstranded: None,
                    fpkm_unstranded: None,
                    fpkm_uq_unstranded: None,
                })
                .collect(),
        }
    }

    #[traced_test]
    #[test]
    fn drift_is_logged_and_recorded() {
        let mut consolidator =
            Consolidator::new(CountType::Unstranded, "Patient_ID", MappingDedup::Triple);
        consolidator
            .add_case(
                "case-1".parse().unwrap(),
                &table("a.tsv", &[("G1", "TSPAN6", "protein_coding", 1.0)]),
            )
            .unwrap();
        assert!(!logs_contain("new gene id(s) encountered"));

        let outcome = consolidator
            .add_case(
                "case-2".parse().unwrap(),
                &table("b.tsv", &[("G2", "TNMD", "protein_coding", 2.0)]),
            )
            .unwrap();

        assert_eq!(outcome.new_gene_ids, vec!["G2"]);
        assert_eq!(
            consolidator.drift_events(),
            &[DriftEvent {
                case_id: "case-2".to_string(),
                new_gene_ids: 1,
            }]
        );
        assert!(logs_contain(
            "1 new gene id(s) encountered; missing values will be introduced for previously processed cases"
        ));
    }

    #[traced_test]
    #[test]
    fn conflicting_annotation_is_logged_and_recorded() {
        let mut consolidator =
            Consolidator::new(CountType::Unstranded, "Patient_ID", MappingDedup::GeneId);
        consolidator
            .add_case(
                "case-1".parse().unwrap(),
                &table("a.tsv", &[("G1", "TSPAN6", "protein_coding", 1.0)]),
            )
            .unwrap();
        let outcome = consolidator
            .add_case(
                "case-2".parse().unwrap(),
                &table("b.tsv", &[("G1", "TSPAN6", "lncRNA", 2.0)]),
            )
            .unwrap();

        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(consolidator.conflicts().len(), 1);
        assert_eq!(consolidator.mapping().len(), 1);
        assert!(logs_contain("gene id annotated inconsistently across cases"));
    }

    #[traced_test]
    #[test]
    fn empty_first_table_still_reports_drift() {
        let mut consolidator =
            Consolidator::new(CountType::Unstranded, "Patient_ID", MappingDedup::Triple);
        consolidator
            .add_case("case-1".parse().unwrap(), &table("empty.tsv", &[]))
            .unwrap();
        assert!(logs_contain("quantification table has no gene rows"));

        consolidator
            .add_case(
                "case-2".parse().unwrap(),
                &table("b.tsv", &[("G1", "TSPAN6", "protein_coding", 2.0)]),
            )
            .unwrap();
        assert_eq!(consolidator.drift_events().len(), 1);
        assert!(logs_contain("new gene id(s) encountered"));
    }

    #[test]
    fn rejected_table_leaves_mapping_untouched() {
        let mut consolidator =
            Consolidator::new(CountType::Unstranded, "Patient_ID", MappingDedup::Triple);
        let err = consolidator
            .add_case(
                "case-1".parse().unwrap(),
                &table(
                    "dup.tsv",
                    &[
                        ("G1", "TSPAN6", "protein_coding", 1.0),
                        ("G1", "TSPAN6", "lncRNA", 2.0),
                    ],
                ),
            )
            .unwrap_err();
        assert_matches!(err, KiraError::DuplicateGeneId { .. });
        assert!(consolidator.matrix().is_empty());
        assert!(consolidator.mapping().is_empty());
        assert!(consolidator.conflicts().is_empty());
    }
}
