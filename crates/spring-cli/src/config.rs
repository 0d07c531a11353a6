use crate::cli::AssemblyArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IntoDeserializer, value::StrDeserializer};
use springpp::engine::config as core_config;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
enum PartialAssemblyPolicy {
    FirstQualifying,
    UntilScored,
}

impl From<PartialAssemblyPolicy> for core_config::AssemblyPolicy {
    fn from(p: PartialAssemblyPolicy) -> Self {
        match p {
            PartialAssemblyPolicy::FirstQualifying => Self::FirstQualifying,
            PartialAssemblyPolicy::UntilScored => Self::UntilScored,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
enum PartialMonomerMode {
    TopHitOnly,
    IterateTopHits,
}

impl From<PartialMonomerMode> for core_config::MonomerMode {
    fn from(p: PartialMonomerMode) -> Self {
        match p {
            PartialMonomerMode::TopHitOnly => Self::TopHitOnly,
            PartialMonomerMode::IterateTopHits => Self::IterateTopHits,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
enum PartialOutputFrame {
    Template,
    Monomer,
}

impl From<PartialOutputFrame> for core_config::OutputFrame {
    fn from(p: PartialOutputFrame) -> Self {
        match p {
            PartialOutputFrame::Template => Self::Template,
            PartialOutputFrame::Monomer => Self::Monomer,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDataConfig {
    index: Option<PathBuf>,
    database: Option<PathBuf>,
    cross_reference: Option<PathBuf>,
    potential: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSearchConfig {
    min_score: Option<f64>,
    max_tries: Option<usize>,
    energy_weight: Option<f64>,
    max_clashes: Option<f64>,
    clash_distance: Option<f64>,
    assembly_policy: Option<PartialAssemblyPolicy>,
    monomer_mode: Option<PartialMonomerMode>,
    all_partners: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialHitConfig {
    min_score: Option<f64>,
    top_hits: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTemplateConfig {
    entry_pattern: Option<String>,
    compression: Option<String>,
    show_template: Option<bool>,
    output_frame: Option<PartialOutputFrame>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialToolConfig {
    superposition: Option<PathBuf>,
    backbone: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

/// The assembly settings of a TOML configuration file, every field optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAssemblyConfig {
    data: Option<PartialDataConfig>,
    search: Option<PartialSearchConfig>,
    hits: Option<PartialHitConfig>,
    templates: Option<PartialTemplateConfig>,
    tools: Option<PartialToolConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialAssemblyConfig {
    /// Reads a configuration file. Relative data paths in the file are taken relative to
    /// the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut partial: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        partial.base_dir = path.parent().map(Path::to_path_buf);
        Ok(partial)
    }

    /// Reads the configuration file named on the command line, if any.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the final configuration: file values, then `-S` overrides, then command-line
    /// flags, then built-in defaults.
    pub fn merge_with_cli(mut self, args: &AssemblyArgs) -> Result<core_config::AssemblyConfig> {
        self.apply_set_values(&args.set_values)?;

        let data = self.data.take().unwrap_or_default();
        let search = self.search.take().unwrap_or_default();
        let hits = self.hits.take().unwrap_or_default();
        let templates = self.templates.take().unwrap_or_default();
        let tools = self.tools.take().unwrap_or_default();
        let base_dir = self.base_dir.as_deref();

        let resolve = |cli: Option<&PathBuf>, file: Option<PathBuf>, key: &str| -> Result<PathBuf> {
            if let Some(path) = cli {
                return Ok(path.clone());
            }
            let path = file.ok_or_else(|| {
                CliError::Config(format!(
                    "A value for '{}' is required either in the config file or via CLI argument.",
                    key
                ))
            })?;
            Ok(match base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            })
        };

        let index_path = resolve(args.index.as_ref(), data.index, "data.index")?;
        let data_path = resolve(args.database.as_ref(), data.database, "data.database")?;
        let cross_reference_path =
            resolve(args.cross.as_ref(), data.cross_reference, "data.cross-reference")?;
        let potential_path = resolve(args.potential.as_ref(), data.potential, "data.potential")?;

        let monomer_mode = if args.iterate_top_hits {
            core_config::MonomerMode::IterateTopHits
        } else {
            search.monomer_mode.map(Into::into).unwrap_or_default()
        };
        let show_template = !args.hide_template && templates.show_template.unwrap_or(true);

        let builder = core_config::AssemblyConfigBuilder::new()
            .index_path(index_path)
            .data_path(data_path)
            .cross_reference_path(cross_reference_path)
            .potential_path(potential_path)
            .min_score(
                args.min_score
                    .or(search.min_score)
                    .unwrap_or(core_config::DEFAULT_MIN_SCORE),
            )
            .max_tries(
                args.max_tries
                    .or(search.max_tries)
                    .unwrap_or(core_config::DEFAULT_MAX_TRIES),
            )
            .energy_weight(
                args.energy_weight
                    .or(search.energy_weight)
                    .unwrap_or(core_config::DEFAULT_ENERGY_WEIGHT),
            )
            .max_clashes(
                args.max_clashes
                    .or(search.max_clashes)
                    .unwrap_or(core_config::DEFAULT_MAX_CLASHES),
            )
            .clash_distance(
                search
                    .clash_distance
                    .unwrap_or(core_config::DEFAULT_CLASH_DISTANCE),
            )
            .assembly_policy(search.assembly_policy.map(Into::into).unwrap_or_default())
            .monomer_mode(monomer_mode)
            .all_partners(search.all_partners.unwrap_or(false))
            .hit_min_score(hits.min_score.unwrap_or(core_config::DEFAULT_HIT_MIN_SCORE))
            .top_hits(hits.top_hits.unwrap_or(core_config::DEFAULT_TOP_HITS))
            .entry_pattern(
                templates
                    .entry_pattern
                    .unwrap_or_else(|| core_config::DEFAULT_ENTRY_PATTERN.to_string()),
            )
            .compression(templates.compression)
            .show_template(show_template)
            .output_frame(templates.output_frame.map(Into::into).unwrap_or_default())
            .superposition_tool(
                tools
                    .superposition
                    .unwrap_or_else(|| PathBuf::from(core_config::DEFAULT_SUPERPOSITION_TOOL)),
            )
            .backbone_tool(
                tools
                    .backbone
                    .unwrap_or_else(|| PathBuf::from(core_config::DEFAULT_BACKBONE_TOOL)),
            )
            .tool_timeout(
                tools
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(core_config::DEFAULT_TOOL_TIMEOUT),
            );

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            self.apply_setting(key, value)?;
        }
        Ok(())
    }

    fn apply_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = key.split_once('.').unwrap_or((key, ""));
        match section {
            "data" => {
                let data = self.data.get_or_insert_with(Default::default);
                let slot = match field {
                    "index" => &mut data.index,
                    "database" => &mut data.database,
                    "cross-reference" => &mut data.cross_reference,
                    "potential" => &mut data.potential,
                    _ => return Err(unsupported_key(key)),
                };
                *slot = Some(value.into());
            }
            "search" => {
                let search = self.search.get_or_insert_with(Default::default);
                match field {
                    "min-score" => search.min_score = Some(parse_value(key, value)?),
                    "max-tries" => search.max_tries = Some(parse_value(key, value)?),
                    "energy-weight" => search.energy_weight = Some(parse_value(key, value)?),
                    "max-clashes" => search.max_clashes = Some(parse_value(key, value)?),
                    "clash-distance" => search.clash_distance = Some(parse_value(key, value)?),
                    "assembly-policy" => search.assembly_policy = Some(parse_choice(key, value)?),
                    "monomer-mode" => search.monomer_mode = Some(parse_choice(key, value)?),
                    "all-partners" => search.all_partners = Some(parse_value(key, value)?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            "hits" => {
                let hits = self.hits.get_or_insert_with(Default::default);
                match field {
                    "min-score" => hits.min_score = Some(parse_value(key, value)?),
                    "top-hits" => hits.top_hits = Some(parse_value(key, value)?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            "templates" => {
                let templates = self.templates.get_or_insert_with(Default::default);
                match field {
                    "entry-pattern" => templates.entry_pattern = Some(value.to_string()),
                    "compression" => templates.compression = Some(value.to_string()),
                    "show-template" => templates.show_template = Some(parse_value(key, value)?),
                    "output-frame" => templates.output_frame = Some(parse_choice(key, value)?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            "tools" => {
                let tools = self.tools.get_or_insert_with(Default::default);
                match field {
                    "superposition" => tools.superposition = Some(value.into()),
                    "backbone" => tools.backbone = Some(value.into()),
                    "timeout-secs" => tools.timeout_secs = Some(parse_value(key, value)?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            _ => return Err(unsupported_key(key)),
        }
        Ok(())
    }
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_choice<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    let deserializer: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
    T::deserialize(deserializer)
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))
}
