use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDrift {
    pub new_gene_ids: Vec<String>,
}

impl SchemaDrift {
    pub fn message(&self) -> String {
        format!(
            "{} new gene id(s) encountered; missing values will be introduced for previously processed cases",
            self.new_gene_ids.len()
        )
    }
}

pub fn check_drift<'a, I>(
    processed_rows: usize,
    columns: &IndexSet<String>,
    gene_ids: I,
) -> Option<SchemaDrift>
where
    I: IntoIterator<Item = &'a str>,
{
    if processed_rows == 0 {
        return None;
    }
    let mut seen = HashSet::new();
    let new_gene_ids = gene_ids
        .into_iter()
        .filter(|gene_id| !columns.contains(*gene_id) && seen.insert(*gene_id))
        .map(str::to_string)
        .collect::<Vec<_>>();
    if new_gene_ids.is_empty() {
        None
    } else {
        Some(SchemaDrift { new_gene_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(ids: &[&str]) -> IndexSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn first_case_is_never_drift() {
        assert_eq!(check_drift(0, &IndexSet::new(), ["G1", "G2"]), None);
    }

    #[test]
    fn subset_is_not_drift() {
        assert_eq!(check_drift(1, &columns(&["G1", "G2", "G3"]), ["G3", "G1"]), None);
    }

    #[test]
    fn reports_new_ids_in_input_order() {
        let drift = check_drift(2, &columns(&["G1", "G2"]), ["G4", "G2", "G3", "G4"]).unwrap();
        assert_eq!(drift.new_gene_ids, vec!["G4", "G3"]);
        assert!(drift.message().starts_with("2 new gene id(s)"));
    }

    #[test]
    fn empty_first_row_still_counts() {
        let drift = check_drift(1, &IndexSet::new(), ["G1"]).unwrap();
        assert_eq!(drift.new_gene_ids, vec!["G1"]);
    }
}
