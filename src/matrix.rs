use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::domain::CaseId;
use crate::drift::{SchemaDrift, check_drift};
use crate::error::KiraError;

pub const DEFAULT_ROW_LABEL: &str = "Patient_ID";

#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    row_label: String,
    columns: IndexSet<String>,
    rows: IndexMap<CaseId, Vec<Option<f64>>>,
}

impl Default for ExpressionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionMatrix {
    pub fn new() -> Self {
        Self::with_row_label(DEFAULT_ROW_LABEL)
    }

    pub fn with_row_label(row_label: impl Into<String>) -> Self {
        Self {
            row_label: row_label.into(),
            columns: IndexSet::new(),
            rows: IndexMap::new(),
        }
    }

    /// The matrix is left untouched when an error is returned.
    pub fn append<I>(&mut self, case_id: CaseId, values: I) -> Result<Option<SchemaDrift>, KiraError>
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        if self.rows.contains_key(&case_id) {
            return Err(KiraError::DuplicateCase(case_id.to_string()));
        }

        let values = values.into_iter().collect::<Vec<_>>();
        let mut seen = HashSet::with_capacity(values.len());
        for (gene_id, _) in &values {
            if !seen.insert(gene_id.as_str()) {
                return Err(KiraError::DuplicateGeneId {
                    case_id: case_id.to_string(),
                    gene_id: gene_id.clone(),
                });
            }
        }

        let drift = check_drift(
            self.rows.len(),
            &self.columns,
            values.iter().map(|(gene_id, _)| gene_id.as_str()),
        );

        let mut row = vec![None; self.columns.len()];
        for (gene_id, value) in values {
            let (column, inserted) = self.columns.insert_full(gene_id);
            if inserted {
                row.push(value);
            } else {
                row[column] = value;
            }
        }
        self.rows.insert(case_id, row);
        Ok(drift)
    }

    pub fn row_label(&self) -> &str {
        &self.row_label
    }

    pub fn columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    pub fn case_ids(&self) -> impl Iterator<Item = &CaseId> {
        self.rows.keys()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, case_id: &CaseId, gene_id: &str) -> Option<f64> {
        let row = self.rows.get(case_id)?;
        let column = self.columns.get_index_of(gene_id)?;
        row.get(column).copied().flatten()
    }

    pub fn row(&self, case_id: &CaseId) -> Option<Vec<Option<f64>>> {
        self.rows.get(case_id).map(|row| self.pad(row))
    }

    pub fn rows(&self) -> impl Iterator<Item = (&CaseId, Vec<Option<f64>>)> {
        self.rows.iter().map(|(case_id, row)| (case_id, self.pad(row)))
    }

    fn pad(&self, row: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut padded = row.to_vec();
        padded.resize(self.columns.len(), None);
        padded
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn case(id: &str) -> CaseId {
        id.parse().unwrap()
    }

    fn genes(values: &[(&str, f64)]) -> Vec<(String, Option<f64>)> {
        values
            .iter()
            .map(|(gene_id, value)| (gene_id.to_string(), Some(*value)))
            .collect()
    }

    #[test]
    fn old_rows_read_null_for_new_columns() {
        let mut matrix = ExpressionMatrix::new();
        matrix.append(case("case-1"), genes(&[("G1", 10.0)])).unwrap();
        let drift = matrix
            .append(case("case-2"), genes(&[("G1", 1.0), ("G2", 2.0)]))
            .unwrap();

        assert_eq!(drift.unwrap().new_gene_ids, vec!["G2"]);
        assert_eq!(matrix.row(&case("case-1")).unwrap(), vec![Some(10.0), None]);
    }

    #[test]
    fn duplicate_gene_leaves_matrix_unchanged() {
        let mut matrix = ExpressionMatrix::new();
        let err = matrix
            .append(case("case-1"), genes(&[("G1", 1.0), ("G1", 2.0)]))
            .unwrap_err();
        assert_matches!(err, KiraError::DuplicateGeneId { .. });
        assert!(matrix.is_empty());
        assert_eq!(matrix.n_columns(), 0);
    }
}
