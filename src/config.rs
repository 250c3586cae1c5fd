//! JSON run configuration.
//!
//! A [`SummaryConfig`] carries the parameters the surrounding CLI/discovery layer decides:
//! the stage vocabulary, requested top-N values, the mutation-class vocabulary and the
//! parser/executor knobs. Every field has a default, so `{}` is a valid configuration.
//!
//! ```rust
//! use cohort_variant_summary::config::SummaryConfig;
//!
//! let cfg = SummaryConfig::from_json_str(
//!     r#"{ "stages": [{ "label": "II", "aliases": ["IIA", "IIB"] }], "top_n": [5, 10] }"#,
//! )
//! .unwrap();
//! assert_eq!(cfg.resolve_stage("iib").unwrap().as_str(), "II");
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::execution::ExecutionOptions;
use crate::ingestion::{CallFile, CallFileFormat, IngestionOptions, ParserConfig, Vocabulary};
use crate::types::{Stage, StageSet};

/// Parameters for one summary run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Declared stages with their subtype aliases. Empty accepts any stage label.
    #[serde(default)]
    pub stages: StageSet,
    /// Ranking sizes to produce for every aggregate.
    #[serde(default = "default_top_n")]
    pub top_n: Vec<usize>,
    /// Replaces the built-in mutation-class vocabulary.
    #[serde(default)]
    pub vocabulary: Option<Vocabulary>,
    /// Format for files whose name does not identify one.
    #[serde(default)]
    pub format: Option<CallFileFormat>,
    /// Replaces the per-format parser presets.
    #[serde(default)]
    pub parser: Option<ParserConfig>,
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub max_in_flight_files: Option<usize>,
}

fn default_top_n() -> Vec<usize> {
    vec![10]
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            stages: StageSet::default(),
            top_n: default_top_n(),
            vocabulary: None,
            format: None,
            parser: None,
            num_threads: None,
            max_in_flight_files: None,
        }
    }
}

impl SummaryConfig {
    /// Parse and validate a configuration.
    pub fn from_json_str(json: &str) -> IngestionResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> IngestionResult<()> {
        self.stages.validate()?;
        if let Some(parser) = &self.parser {
            parser.validate()?;
        }
        self.execution_options().validate()?;
        if self.vocabulary.as_ref().is_some_and(Vocabulary::is_empty) {
            return Err(IngestionError::Config {
                message: "vocabulary override is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Canonical stage for a raw label (subtype aliases included).
    pub fn resolve_stage(&self, label: &str) -> IngestionResult<Stage> {
        self.stages.resolve(label)
    }

    /// Stages that should appear in the output even without input files.
    pub fn declared_stages(&self) -> Vec<Stage> {
        self.stages.stages()
    }

    /// Build a [`CallFile`], resolving `stage_label` against the stage set.
    pub fn call_file(
        &self,
        path: impl AsRef<Path>,
        stage_label: &str,
        sample_id: impl Into<String>,
    ) -> IngestionResult<CallFile> {
        Ok(CallFile::new(path, self.resolve_stage(stage_label)?, sample_id))
    }

    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            format: self.format,
            parser: self.parser.clone(),
            vocabulary: Arc::new(self.vocabulary.clone().unwrap_or_default()),
            ..IngestionOptions::default()
        }
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        let defaults = ExecutionOptions::default();
        ExecutionOptions {
            num_threads: self.num_threads.or(defaults.num_threads),
            max_in_flight_files: self.max_in_flight_files.unwrap_or(defaults.max_in_flight_files),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SummaryConfig;
    use crate::error::IngestionError;
    use crate::ingestion::CallFileFormat;
    use crate::types::MutationClass;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = SummaryConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, SummaryConfig::default());
        assert_eq!(cfg.top_n, vec![10]);
        // No declared stages: any label is its own stage.
        assert_eq!(cfg.resolve_stage("Stage X").unwrap().as_str(), "Stage X");
    }

    #[test]
    fn stage_aliases_and_unknown_labels() {
        let cfg = SummaryConfig::from_json_str(
            r#"{ "stages": [
                    { "label": "I", "aliases": ["IA", "IB"] },
                    { "label": "II", "aliases": ["IIA", "IIB"] }
                ] }"#,
        )
        .unwrap();
        assert_eq!(cfg.resolve_stage("IIA").unwrap().as_str(), "II");
        assert_eq!(cfg.resolve_stage(" ib ").unwrap().as_str(), "I");
        assert_eq!(cfg.declared_stages().len(), 2);

        let err = cfg.call_file("a.maf", "IV", "S1").unwrap_err();
        assert!(matches!(err, IngestionError::UnknownStage { .. }));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            SummaryConfig::from_json_str(r#"{ "top_n": "ten" }"#),
            Err(IngestionError::Json(_))
        ));
        assert!(matches!(
            SummaryConfig::from_json_str(r#"{ "unknown_key": 1 }"#),
            Err(IngestionError::Json(_))
        ));
        assert!(matches!(
            SummaryConfig::from_json_str(r#"{ "max_in_flight_files": 0 }"#),
            Err(IngestionError::Config { .. })
        ));
        assert!(matches!(
            SummaryConfig::from_json_str(
                r#"{ "stages": [{ "label": "II", "aliases": ["IIA"] }, { "label": "iia" }] }"#
            ),
            Err(IngestionError::Config { .. })
        ));
    }

    #[test]
    fn vocabulary_and_format_overrides_reach_ingestion_options() {
        let cfg = SummaryConfig::from_json_str(
            r#"{ "format": "maf", "vocabulary": { "missense": ["Missense_Mutation", "MISSENSE"] } }"#,
        )
        .unwrap();
        let opts = cfg.ingestion_options();
        assert_eq!(opts.format, Some(CallFileFormat::Maf));
        assert_eq!(opts.vocabulary.resolve("missense_mutation"), MutationClass::new("missense"));
        assert!(opts.vocabulary.resolve("Silent").is_other());
    }
}
