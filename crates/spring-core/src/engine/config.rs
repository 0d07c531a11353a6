use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MIN_SCORE: f64 = 10.0;
pub const DEFAULT_MAX_TRIES: usize = 20;
pub const DEFAULT_ENERGY_WEIGHT: f64 = -0.01;
pub const DEFAULT_MAX_CLASHES: f64 = 0.1;
pub const DEFAULT_CLASH_DISTANCE: f64 = 5.0;
pub const DEFAULT_HIT_MIN_SCORE: f64 = 10.0;
pub const DEFAULT_TOP_HITS: usize = 5;
pub const DEFAULT_ENTRY_PATTERN: &str = "pdb{}.ent";
pub const DEFAULT_SUPERPOSITION_TOOL: &str = "TMalign";
pub const DEFAULT_BACKBONE_TOOL: &str = "pulchra";
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// How many biological assemblies of one template are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyPolicy {
    /// Stop after the first assembly holding both chains, whether or not it scored.
    #[default]
    FirstQualifying,
    /// Keep scanning assemblies until one has been scored successfully.
    UntilScored,
}

/// Which homology hits are used to build the monomer models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonomerMode {
    /// Only the best hit; failing to build it fails the run.
    #[default]
    TopHitOnly,
    /// Every combination of top hits whose monomers both build.
    IterateTopHits,
}

/// Coordinate frame of the written model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFrame {
    /// The frame of the complex template.
    #[default]
    Template,
    /// The frame of monomer model A.
    Monomer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub index_path: PathBuf,
    pub data_path: PathBuf,
    pub cross_reference_path: PathBuf,
    pub potential_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub min_score: f64,
    pub max_tries: usize,
    pub energy_weight: f64,
    pub max_clashes: f64,
    pub clash_distance: f64,
    pub assembly_policy: AssemblyPolicy,
    pub monomer_mode: MonomerMode,
    pub all_partners: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitConfig {
    pub min_score: f64,
    pub top_hits: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    pub entry_pattern: String,
    pub compression: Option<String>,
    pub show_template: bool,
    pub output_frame: OutputFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub superposition: PathBuf,
    pub backbone: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    pub data: DataConfig,
    pub search: SearchConfig,
    pub hits: HitConfig,
    pub templates: TemplateConfig,
    pub tools: ToolConfig,
}

#[derive(Default)]
pub struct AssemblyConfigBuilder {
    index_path: Option<PathBuf>,
    data_path: Option<PathBuf>,
    cross_reference_path: Option<PathBuf>,
    potential_path: Option<PathBuf>,
    min_score: Option<f64>,
    max_tries: Option<usize>,
    energy_weight: Option<f64>,
    max_clashes: Option<f64>,
    clash_distance: Option<f64>,
    assembly_policy: Option<AssemblyPolicy>,
    monomer_mode: Option<MonomerMode>,
    all_partners: Option<bool>,
    hit_min_score: Option<f64>,
    top_hits: Option<usize>,
    entry_pattern: Option<String>,
    compression: Option<String>,
    show_template: Option<bool>,
    output_frame: Option<OutputFrame>,
    superposition_tool: Option<PathBuf>,
    backbone_tool: Option<PathBuf>,
    tool_timeout: Option<Duration>,
}

impl AssemblyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.index_path = Some(path);
        self
    }
    pub fn data_path(mut self, path: PathBuf) -> Self {
        self.data_path = Some(path);
        self
    }
    pub fn cross_reference_path(mut self, path: PathBuf) -> Self {
        self.cross_reference_path = Some(path);
        self
    }
    pub fn potential_path(mut self, path: PathBuf) -> Self {
        self.potential_path = Some(path);
        self
    }
    pub fn min_score(mut self, score: f64) -> Self {
        self.min_score = Some(score);
        self
    }
    pub fn max_tries(mut self, tries: usize) -> Self {
        self.max_tries = Some(tries);
        self
    }
    pub fn energy_weight(mut self, weight: f64) -> Self {
        self.energy_weight = Some(weight);
        self
    }
    pub fn max_clashes(mut self, fraction: f64) -> Self {
        self.max_clashes = Some(fraction);
        self
    }
    pub fn clash_distance(mut self, distance: f64) -> Self {
        self.clash_distance = Some(distance);
        self
    }
    pub fn assembly_policy(mut self, policy: AssemblyPolicy) -> Self {
        self.assembly_policy = Some(policy);
        self
    }
    pub fn monomer_mode(mut self, mode: MonomerMode) -> Self {
        self.monomer_mode = Some(mode);
        self
    }
    pub fn all_partners(mut self, all: bool) -> Self {
        self.all_partners = Some(all);
        self
    }
    pub fn hit_min_score(mut self, score: f64) -> Self {
        self.hit_min_score = Some(score);
        self
    }
    pub fn top_hits(mut self, n: usize) -> Self {
        self.top_hits = Some(n);
        self
    }
    pub fn entry_pattern(mut self, pattern: String) -> Self {
        self.entry_pattern = Some(pattern);
        self
    }
    pub fn compression(mut self, suffix: Option<String>) -> Self {
        self.compression = suffix;
        self
    }
    pub fn show_template(mut self, show: bool) -> Self {
        self.show_template = Some(show);
        self
    }
    pub fn output_frame(mut self, frame: OutputFrame) -> Self {
        self.output_frame = Some(frame);
        self
    }
    pub fn superposition_tool(mut self, tool: PathBuf) -> Self {
        self.superposition_tool = Some(tool);
        self
    }
    pub fn backbone_tool(mut self, tool: PathBuf) -> Self {
        self.backbone_tool = Some(tool);
        self
    }
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AssemblyConfig, ConfigError> {
        let data = DataConfig {
            index_path: self
                .index_path
                .ok_or(ConfigError::MissingParameter("index_path"))?,
            data_path: self
                .data_path
                .ok_or(ConfigError::MissingParameter("data_path"))?,
            cross_reference_path: self
                .cross_reference_path
                .ok_or(ConfigError::MissingParameter("cross_reference_path"))?,
            potential_path: self
                .potential_path
                .ok_or(ConfigError::MissingParameter("potential_path"))?,
        };
        let search = SearchConfig {
            min_score: self.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            max_tries: self.max_tries.unwrap_or(DEFAULT_MAX_TRIES),
            energy_weight: self.energy_weight.unwrap_or(DEFAULT_ENERGY_WEIGHT),
            max_clashes: self.max_clashes.unwrap_or(DEFAULT_MAX_CLASHES),
            clash_distance: self.clash_distance.unwrap_or(DEFAULT_CLASH_DISTANCE),
            assembly_policy: self.assembly_policy.unwrap_or_default(),
            monomer_mode: self.monomer_mode.unwrap_or_default(),
            all_partners: self.all_partners.unwrap_or(false),
        };
        if !(0.0..=1.0).contains(&search.max_clashes) {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_clashes",
                reason: format!("{} is not a fraction in [0, 1]", search.max_clashes),
            });
        }
        if search.clash_distance <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "clash_distance",
                reason: format!("{} must be positive", search.clash_distance),
            });
        }

        let entry_pattern = self
            .entry_pattern
            .unwrap_or_else(|| DEFAULT_ENTRY_PATTERN.to_string());
        if !entry_pattern.contains("{}") {
            return Err(ConfigError::InvalidParameter {
                parameter: "entry_pattern",
                reason: format!("'{}' has no '{{}}' placeholder", entry_pattern),
            });
        }

        Ok(AssemblyConfig {
            data,
            search,
            hits: HitConfig {
                min_score: self.hit_min_score.unwrap_or(DEFAULT_HIT_MIN_SCORE),
                top_hits: self.top_hits.unwrap_or(DEFAULT_TOP_HITS),
            },
            templates: TemplateConfig {
                entry_pattern,
                compression: self.compression.filter(|suffix| !suffix.is_empty()),
                show_template: self.show_template.unwrap_or(true),
                output_frame: self.output_frame.unwrap_or_default(),
            },
            tools: ToolConfig {
                superposition: self
                    .superposition_tool
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SUPERPOSITION_TOOL)),
                backbone: self
                    .backbone_tool
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKBONE_TOOL)),
                timeout: self.tool_timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_data_paths() -> AssemblyConfigBuilder {
        AssemblyConfigBuilder::new()
            .index_path("pdb.index".into())
            .data_path("pdb.data".into())
            .cross_reference_path("cross.txt".into())
            .potential_path("dfire.data".into())
    }

    #[test]
    fn build_applies_defaults() {
        let config = with_data_paths().build().unwrap();

        assert_eq!(config.search.min_score, 10.0);
        assert_eq!(config.search.max_tries, 20);
        assert_eq!(config.search.energy_weight, -0.01);
        assert_eq!(config.search.max_clashes, 0.1);
        assert_eq!(config.search.clash_distance, 5.0);
        assert_eq!(config.search.assembly_policy, AssemblyPolicy::FirstQualifying);
        assert_eq!(config.search.monomer_mode, MonomerMode::TopHitOnly);
        assert!(!config.search.all_partners);
        assert_eq!(config.hits.min_score, 10.0);
        assert_eq!(config.hits.top_hits, 5);
        assert_eq!(config.templates.entry_pattern, "pdb{}.ent");
        assert_eq!(config.templates.compression, None);
        assert!(config.templates.show_template);
        assert_eq!(config.templates.output_frame, OutputFrame::Template);
        assert_eq!(config.tools.superposition, PathBuf::from("TMalign"));
        assert_eq!(config.tools.backbone, PathBuf::from("pulchra"));
        assert_eq!(config.tools.timeout, Duration::from_secs(600));
    }

    #[test]
    fn build_reports_first_missing_data_path() {
        let result = AssemblyConfigBuilder::new()
            .index_path("pdb.index".into())
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("data_path")));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = with_data_paths()
            .max_tries(3)
            .assembly_policy(AssemblyPolicy::UntilScored)
            .monomer_mode(MonomerMode::IterateTopHits)
            .compression(Some("gz".to_string()))
            .output_frame(OutputFrame::Monomer)
            .tool_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.search.max_tries, 3);
        assert_eq!(config.search.assembly_policy, AssemblyPolicy::UntilScored);
        assert_eq!(config.search.monomer_mode, MonomerMode::IterateTopHits);
        assert_eq!(config.templates.compression.as_deref(), Some("gz"));
        assert_eq!(config.templates.output_frame, OutputFrame::Monomer);
        assert_eq!(config.tools.timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_compression_suffix_means_uncompressed() {
        let config = with_data_paths()
            .compression(Some(String::new()))
            .build()
            .unwrap();
        assert_eq!(config.templates.compression, None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            with_data_paths().max_clashes(1.5).build(),
            Err(ConfigError::InvalidParameter { parameter: "max_clashes", .. })
        ));
        assert!(matches!(
            with_data_paths().clash_distance(0.0).build(),
            Err(ConfigError::InvalidParameter { parameter: "clash_distance", .. })
        ));
        assert!(matches!(
            with_data_paths().entry_pattern("pdb.ent".to_string()).build(),
            Err(ConfigError::InvalidParameter { parameter: "entry_pattern", .. })
        ));
    }
}
