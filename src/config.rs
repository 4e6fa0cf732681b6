use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{CountType, MappingDedup};
use crate::error::KiraError;
use crate::gdc::DEFAULT_API_BASE_URL;
use crate::matrix::DEFAULT_ROW_LABEL;

pub const DEFAULT_CONFIG_FILE: &str = "kira-cm.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
    #[serde(default)]
    pub cohort_column: Option<String>,
    #[serde(default)]
    pub type_of_counts: Option<CountType>,
    #[serde(default)]
    pub mapping_dedup: Option<MappingDedup>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub matrix_output: Option<String>,
    #[serde(default)]
    pub mapping_output: Option<String>,
    #[serde(default)]
    pub row_label: Option<String>,
    #[serde(default)]
    pub raw_dir: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub manifest: Option<String>,
    pub cohort: Option<String>,
    pub type_of_counts: Option<CountType>,
    pub mapping_dedup: Option<MappingDedup>,
    pub matrix_output: Option<String>,
    pub mapping_output: Option<String>,
    pub raw_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub manifest: Utf8PathBuf,
    pub cohort: Utf8PathBuf,
    pub cohort_column: String,
    pub type_of_counts: CountType,
    pub mapping_dedup: MappingDedup,
    pub api_base_url: String,
    pub matrix_output: Utf8PathBuf,
    pub mapping_output: Utf8PathBuf,
    pub row_label: String,
    pub raw_dir: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.as_std_path().exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(config_path.as_std_path())
                .map_err(|_| KiraError::ConfigRead(config_path.clone().into_std_path_buf()))?;
            serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))?
        };

        Ok(Self::resolve_config(config, overrides))
    }

    pub fn resolve_config(config: Config, overrides: ConfigOverrides) -> ResolvedConfig {
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            manifest: overrides
                .manifest
                .or(config.manifest)
                .unwrap_or_else(|| "data/manifest.json".to_string())
                .into(),
            cohort: overrides
                .cohort
                .or(config.cohort)
                .unwrap_or_else(|| "data/supertreat_cases.csv".to_string())
                .into(),
            cohort_column: config
                .cohort_column
                .unwrap_or_else(|| "case_uuid".to_string()),
            type_of_counts: overrides
                .type_of_counts
                .or(config.type_of_counts)
                .unwrap_or_default(),
            mapping_dedup: overrides
                .mapping_dedup
                .or(config.mapping_dedup)
                .unwrap_or_default(),
            api_base_url: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            matrix_output: overrides
                .matrix_output
                .or(config.matrix_output)
                .unwrap_or_else(|| "gene_expression.csv".to_string())
                .into(),
            mapping_output: overrides
                .mapping_output
                .or(config.mapping_output)
                .unwrap_or_else(|| "gene_mapping.csv".to_string())
                .into(),
            row_label: config
                .row_label
                .unwrap_or_else(|| DEFAULT_ROW_LABEL.to_string()),
            raw_dir: overrides.raw_dir.or(config.raw_dir).map(Utf8PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let resolved = ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default());
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.type_of_counts, CountType::Unstranded);
        assert_eq!(resolved.mapping_dedup, MappingDedup::Triple);
        assert_eq!(resolved.cohort_column, "case_uuid");
        assert_eq!(resolved.row_label, "Patient_ID");
        assert!(resolved.raw_dir.is_none());
    }
}
