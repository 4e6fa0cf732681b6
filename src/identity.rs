use std::collections::HashSet;

use indexmap::IndexMap;

use crate::domain::CaseId;
use crate::error::KiraError;
use crate::manifest::ManifestEntry;

#[derive(Debug, Clone, Default)]
pub struct CaseFileIndex {
    file_dict: IndexMap<CaseId, String>,
    inv_file_dict: IndexMap<String, CaseId>,
    unmatched: Vec<CaseId>,
}

impl CaseFileIndex {
    pub fn resolve(manifest: &[ManifestEntry], cohort: &[CaseId]) -> Result<Self, KiraError> {
        let members = cohort.iter().collect::<HashSet<_>>();
        let mut index = CaseFileIndex::default();

        for entry in manifest {
            let file_name = entry.file_name.trim();
            if file_name.is_empty() {
                return Err(KiraError::InvalidManifest(
                    "entry without file_name".to_string(),
                ));
            }
            let primary = entry.primary_case().ok_or_else(|| {
                KiraError::InvalidManifest(format!("file {file_name} lists no cases"))
            })?;
            let case_id: CaseId = primary.case_id.parse().map_err(|_| {
                KiraError::InvalidManifest(format!("file {file_name} has an empty case_id"))
            })?;

            if entry.cases.len() > 1 {
                let dropped = entry.cases[1..]
                    .iter()
                    .map(|case| case.case_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::warn!(
                    file_name,
                    case_id = case_id.as_str(),
                    dropped = dropped.as_str(),
                    "file lists several cases; only the first one is used"
                );
            }

            if !members.contains(&case_id) {
                continue;
            }
            index.insert(case_id, file_name.to_string())?;
        }

        let mut seen = HashSet::new();
        for case_id in cohort {
            if seen.insert(case_id) && !index.file_dict.contains_key(case_id) {
                index.unmatched.push(case_id.clone());
            }
        }

        Ok(index)
    }

    fn insert(&mut self, case_id: CaseId, file_name: String) -> Result<(), KiraError> {
        if let Some(existing) = self.file_dict.get(&case_id) {
            if *existing == file_name {
                return Ok(());
            }
            return Err(KiraError::CaseCollision {
                case_id: case_id.to_string(),
                first: existing.clone(),
                second: file_name,
            });
        }
        if let Some(owner) = self.inv_file_dict.get(&file_name) {
            return Err(KiraError::IdentityCollision {
                file_name,
                first: owner.to_string(),
                second: case_id.to_string(),
            });
        }
        self.inv_file_dict.insert(file_name.clone(), case_id.clone());
        self.file_dict.insert(case_id, file_name);
        Ok(())
    }

    pub fn file_for(&self, case_id: &CaseId) -> Option<&str> {
        self.file_dict.get(case_id).map(String::as_str)
    }

    pub fn case_for(&self, file_name: &str) -> Option<&CaseId> {
        self.inv_file_dict.get(file_name)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.file_dict.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CaseId, &str)> {
        self.file_dict
            .iter()
            .map(|(case_id, file_name)| (case_id, file_name.as_str()))
    }

    pub fn unmatched(&self) -> &[CaseId] {
        &self.unmatched
    }

    pub fn len(&self) -> usize {
        self.file_dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_dict.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::manifest::parse_manifest;

    #[traced_test]
    #[test]
    fn multi_case_entry_warns_and_uses_first_case() {
        let manifest = parse_manifest(
            r#"[{"file_name": "a.tsv", "cases": [{"case_id": "case-1"}, {"case_id": "case-2"}]}]"#,
        )
        .unwrap();
        let cohort = vec!["case-1".parse().unwrap(), "case-2".parse().unwrap()];
        let index = CaseFileIndex::resolve(&manifest, &cohort).unwrap();

        assert_eq!(index.file_for(&cohort[0]), Some("a.tsv"));
        assert_eq!(index.unmatched(), &cohort[1..]);
        assert!(logs_contain("file lists several cases; only the first one is used"));
        assert!(logs_contain("case-2"));
    }

    #[traced_test]
    #[test]
    fn single_case_entry_does_not_warn() {
        let manifest =
            parse_manifest(r#"[{"file_name": "a.tsv", "cases": [{"case_id": "case-1"}]}]"#)
                .unwrap();
        let cohort = vec!["case-1".parse().unwrap()];
        let index = CaseFileIndex::resolve(&manifest, &cohort).unwrap();

        assert!(!index.is_empty());
        assert!(!logs_contain("several cases"));
    }
}
