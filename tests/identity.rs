use assert_matches::assert_matches;

use kira_cohort_matrix::domain::CaseId;
use kira_cohort_matrix::error::KiraError;
use kira_cohort_matrix::identity::CaseFileIndex;
use kira_cohort_matrix::manifest::{ManifestEntry, load_manifest, parse_manifest};

fn cohort(ids: &[&str]) -> Vec<CaseId> {
    ids.iter().map(|id| id.parse().unwrap()).collect()
}

fn manifest(json: &str) -> Vec<ManifestEntry> {
    parse_manifest(json).unwrap()
}

#[test]
fn resolve_restricts_to_cohort() {
    let entries = load_manifest("tests/fixtures/manifest.json".as_ref()).unwrap();
    let index = CaseFileIndex::resolve(&entries, &cohort(&["case-1", "case-2", "case-2"])).unwrap();

    assert_eq!(index.len(), 2);
    assert!(index.file_for(&"case-3".parse().unwrap()).is_none());
    assert_eq!(
        index.file_names(),
        vec![
            "a1.rna_seq.augmented_star_gene_counts.tsv",
            "b2.rna_seq.augmented_star_gene_counts.tsv",
        ]
    );
}

#[test]
fn inverse_is_exact() {
    let entries = load_manifest("tests/fixtures/manifest.json".as_ref()).unwrap();
    let index =
        CaseFileIndex::resolve(&entries, &cohort(&["case-1", "case-2", "case-3"])).unwrap();

    for (case_id, file_name) in index.iter() {
        assert_eq!(index.case_for(file_name), Some(case_id));
        assert_eq!(index.file_for(case_id), Some(file_name));
    }
}

#[test]
fn shared_file_name_is_a_collision() {
    let entries = manifest(
        r#"[
        {"file_name": "shared.tsv", "cases": [{"case_id": "case-1"}]},
        {"file_name": "shared.tsv", "cases": [{"case_id": "case-2"}]}
    ]"#,
    );
    let err = CaseFileIndex::resolve(&entries, &cohort(&["case-1", "case-2"])).unwrap_err();
    assert_matches!(
        err,
        KiraError::IdentityCollision { file_name, first, second }
            if file_name == "shared.tsv" && first == "case-1" && second == "case-2"
    );
}

#[test]
fn shared_file_outside_cohort_is_ignored() {
    let entries = manifest(
        r#"[
        {"file_name": "shared.tsv", "cases": [{"case_id": "case-1"}]},
        {"file_name": "shared.tsv", "cases": [{"case_id": "case-7"}]}
    ]"#,
    );
    let index = CaseFileIndex::resolve(&entries, &cohort(&["case-1"])).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn case_with_two_files_is_a_collision() {
    let entries = manifest(
        r#"[
        {"file_name": "first.tsv", "cases": [{"case_id": "case-1"}]},
        {"file_name": "second.tsv", "cases": [{"case_id": "case-1"}]}
    ]"#,
    );
    let err = CaseFileIndex::resolve(&entries, &cohort(&["case-1"])).unwrap_err();
    assert_matches!(err, KiraError::CaseCollision { .. });
}

#[test]
fn repeated_identical_entry_is_accepted() {
    let entries = manifest(
        r#"[
        {"file_name": "first.tsv", "cases": [{"case_id": "case-1"}]},
        {"file_name": "first.tsv", "cases": [{"case_id": "case-1"}]}
    ]"#,
    );
    let index = CaseFileIndex::resolve(&entries, &cohort(&["case-1"])).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn only_first_case_of_entry_is_used() {
    let entries = manifest(
        r#"[
        {"file_name": "pooled.tsv", "cases": [{"case_id": "case-1"}, {"case_id": "case-2"}]}
    ]"#,
    );
    let index = CaseFileIndex::resolve(&entries, &cohort(&["case-1", "case-2"])).unwrap();

    assert_eq!(index.case_for("pooled.tsv").unwrap().as_str(), "case-1");
    let unmatched = index
        .unmatched()
        .iter()
        .map(CaseId::as_str)
        .collect::<Vec<_>>();
    assert_eq!(unmatched, vec!["case-2"]);
}

#[test]
fn entry_without_cases_is_invalid() {
    let entries = manifest(r#"[{"file_name": "orphan.tsv", "cases": []}]"#);
    let err = CaseFileIndex::resolve(&entries, &cohort(&["case-1"])).unwrap_err();
    assert_matches!(err, KiraError::InvalidManifest(_));
}

#[test]
fn empty_case_id_is_invalid() {
    let entries = manifest(r#"[{"file_name": "a.tsv", "cases": [{"case_id": " "}]}]"#);
    let err = CaseFileIndex::resolve(&entries, &cohort(&["case-1"])).unwrap_err();
    assert_matches!(err, KiraError::InvalidManifest(_));
}
