use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{GeneAnnotation, MappingDedup};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingConflict {
    pub gene_id: String,
    pub first: GeneAnnotation,
    pub conflicting: GeneAnnotation,
    pub kept: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GeneMapping {
    mode: MappingDedup,
    rows: Vec<GeneAnnotation>,
    seen: HashSet<GeneAnnotation>,
    first_by_gene: HashMap<String, usize>,
}

impl GeneMapping {
    pub fn new(mode: MappingDedup) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> MappingDedup {
        self.mode
    }

    /// Conflicts are returned once per distinct triple.
    pub fn append<I>(&mut self, annotations: I) -> Vec<MappingConflict>
    where
        I: IntoIterator<Item = GeneAnnotation>,
    {
        let mut conflicts = Vec::new();
        for annotation in annotations {
            if self.seen.contains(&annotation) {
                continue;
            }
            let first = match self.first_by_gene.get(&annotation.gene_id).copied() {
                None => {
                    self.first_by_gene
                        .insert(annotation.gene_id.clone(), self.rows.len());
                    self.keep(annotation);
                    continue;
                }
                Some(index) => self.rows[index].clone(),
            };

            let kept = self.mode == MappingDedup::Triple;
            tracing::warn!(
                gene_id = annotation.gene_id.as_str(),
                first_name = first.gene_name.as_str(),
                first_type = first.gene_type.as_str(),
                gene_name = annotation.gene_name.as_str(),
                gene_type = annotation.gene_type.as_str(),
                kept,
                "gene id annotated inconsistently across cases"
            );
            conflicts.push(MappingConflict {
                gene_id: annotation.gene_id.clone(),
                first,
                conflicting: annotation.clone(),
                kept,
            });
            if kept {
                self.keep(annotation);
            } else {
                self.seen.insert(annotation);
            }
        }
        conflicts
    }

    fn keep(&mut self, annotation: GeneAnnotation) {
        self.seen.insert(annotation.clone());
        self.rows.push(annotation);
    }

    pub fn rows(&self) -> &[GeneAnnotation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn gene_id_mode_keeps_first_annotation() {
        let mut mapping = GeneMapping::new(MappingDedup::GeneId);
        mapping.append([GeneAnnotation::new("G1", "TSPAN6", "protein_coding")]);
        let conflicts = mapping.append([GeneAnnotation::new("G1", "TSPAN6", "lncRNA")]);

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.rows()[0].gene_type, "protein_coding");
        assert_eq!(conflicts.len(), 1);
        assert!(!conflicts[0].kept);

        // already reported once
        assert!(
            mapping
                .append([GeneAnnotation::new("G1", "TSPAN6", "lncRNA")])
                .is_empty()
        );
    }

    #[traced_test]
    #[test]
    fn triple_mode_warns_and_keeps_both_rows() {
        let mut mapping = GeneMapping::new(MappingDedup::Triple);
        mapping.append([GeneAnnotation::new("G1", "TSPAN6", "protein_coding")]);
        assert!(!logs_contain("annotated inconsistently"));

        let conflicts = mapping.append([GeneAnnotation::new("G1", "TSPAN6-AS", "protein_coding")]);
        assert_eq!(mapping.len(), 2);
        assert!(conflicts[0].kept);
        assert!(logs_contain("gene id annotated inconsistently across cases"));
        assert!(logs_contain("TSPAN6-AS"));
    }
}
