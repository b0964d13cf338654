//! Supplier profile compilation.
//!
//! A [`ProfileSpec`] is validated once at load time: every regex is compiled
//! and exactly one extraction [`Strategy`] is derived from the populated
//! fields. A broken profile fails the whole load instead of failing per line.

mod resolver;

pub use resolver::{resolve, Resolution};

use std::path::Path;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::error::{LivrError, ProfileError};
use crate::models::delivery::StrategyKind;
use crate::models::profile::{BlockSpec, MultilineSpec, ProfileSpec, ProfileStore, TableSpec};
use crate::text::normalize_light;

/// Block start/stop markers. Both search anywhere in the line, ignoring case.
#[derive(Debug, Clone)]
pub struct BlockRules {
    pub start: Regex,
    pub stop: Option<Regex>,
}

/// Which lines the multi-line strategy scans.
#[derive(Debug, Clone)]
pub enum LineScope {
    /// The whole line stream.
    Full,
    /// Only the isolated block.
    Block(BlockRules),
}

/// Compiled multi-line item layout.
#[derive(Debug, Clone)]
pub struct MultilineRules {
    /// Anchored at line start.
    pub start: Regex,
    /// Anchored at line start.
    pub description: Option<Regex>,
    pub max_lookahead: usize,
    pub code_group: String,
    pub quantity_group: String,
    pub description_group: String,
    pub inline_description_group: String,
    pub boundary_markers: Vec<String>,
}

impl MultilineRules {
    /// Whether a line is a subtotal/boundary marker.
    pub fn is_boundary(&self, text: &str) -> bool {
        self.boundary_markers
            .iter()
            .any(|m| !m.is_empty() && text.starts_with(m.as_str()))
    }
}

/// Compiled grid-mode rules.
#[derive(Debug, Clone)]
pub struct GridRules {
    /// Anchored at candidate start.
    pub item: Regex,
    pub header: String,
    pub fixed_flavor: Option<String>,
    pub preferred_flavors: Vec<String>,
    pub code_in_description: Option<Regex>,
}

/// The single extraction strategy of a profile.
#[derive(Debug, Clone)]
pub enum Strategy {
    SingleLine {
        block: Option<BlockRules>,
        item: Regex,
    },
    MultiBlock {
        header: Regex,
        item: Regex,
    },
    Multiline {
        rules: MultilineRules,
        header: Option<Regex>,
        scope: LineScope,
    },
    Grid(GridRules),
}

impl Strategy {
    /// Serializable tag of the strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SingleLine { .. } => StrategyKind::SingleLine,
            Self::MultiBlock { .. } => StrategyKind::MultiBlock,
            Self::Multiline { .. } => StrategyKind::Multiline,
            Self::Grid(_) => StrategyKind::Grid,
        }
    }
}

/// Numeric conversion declared for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
    Number,
}

/// Compiled document metadata rules.
#[derive(Debug, Clone, Default)]
pub struct MetadataRules {
    pub date: Option<Regex>,
    pub order: Option<Regex>,
}

/// A validated supplier profile.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    /// Supplier name.
    pub name: String,
    /// Detection patterns as declared.
    pub detection_patterns: Vec<String>,
    /// Detection patterns in light-normalized form.
    pub normalized_patterns: Vec<String>,
    /// Extraction strategy.
    pub strategy: Strategy,
    /// Field conversions, keyed by field name.
    pub numeric_fields: IndexMap<String, NumericKind>,
    /// Metadata rules.
    pub metadata: MetadataRules,
}

impl CompiledProfile {
    /// Validate and compile a profile.
    pub fn compile(name: &str, spec: &ProfileSpec) -> Result<Self, ProfileError> {
        let strategy = compile_strategy(name, spec)?;
        let numeric_fields = compile_post_processing(name, spec)?;

        let metadata = match &spec.metadata {
            Some(m) => MetadataRules {
                date: m
                    .date_pattern
                    .as_deref()
                    .map(|p| search(name, "metadata.date_pattern", p))
                    .transpose()?,
                order: m
                    .order_pattern
                    .as_deref()
                    .map(|p| search(name, "metadata.order_pattern", p))
                    .transpose()?,
            },
            None => MetadataRules::default(),
        };

        let detection_patterns: Vec<String> = spec
            .detection_patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();
        let normalized_patterns = detection_patterns.iter().map(|p| normalize_light(p)).collect();

        debug!("Compiled profile '{}' with {} strategy", name, strategy.kind());

        Ok(Self {
            name: name.to_string(),
            detection_patterns,
            normalized_patterns,
            strategy,
            numeric_fields,
            metadata,
        })
    }
}

/// Ordered set of compiled profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: Vec<CompiledProfile>,
}

impl ProfileSet {
    /// Compile every profile of a store, failing on the first broken one.
    pub fn compile(store: &ProfileStore) -> Result<Self, ProfileError> {
        if store.is_empty() {
            warn!("Profile store declares no supplier; every document will be unknown");
        }
        debug!("Compiling {} profiles", store.len());
        let profiles = store
            .suppliers
            .iter()
            .map(|(name, spec)| CompiledProfile::compile(name, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { profiles })
    }

    /// Load and compile a JSON profile store.
    pub fn load(path: &Path) -> Result<Self, LivrError> {
        let store = ProfileStore::from_file(path)?;
        Ok(Self::compile(&store)?)
    }

    /// Profiles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn compile_strategy(name: &str, spec: &ProfileSpec) -> Result<Strategy, ProfileError> {
    let ambiguous = |reason: &str| ProfileError::AmbiguousStrategy {
        profile: name.to_string(),
        reason: reason.to_string(),
    };
    let none = |reason: &str| ProfileError::NoStrategy {
        profile: name.to_string(),
        reason: reason.to_string(),
    };

    if let Some(table) = &spec.table {
        if spec.multiline.is_some() || spec.multi_block {
            return Err(ambiguous("table layout cannot be combined with multiline or multi_block"));
        }
        if spec.block.is_some() {
            return Err(ambiguous("table layout cannot be combined with block markers"));
        }
        let item = spec
            .item_pattern
            .as_deref()
            .ok_or_else(|| none("table layout requires item_pattern"))?;
        return compile_grid(name, table, item).map(Strategy::Grid);
    }

    if let Some(multiline) = &spec.multiline {
        if spec.item_pattern.is_some() {
            return Err(ambiguous("multiline and item_pattern are both declared"));
        }
        let rules = compile_multiline(name, multiline)?;
        let header = spec
            .header_pattern
            .as_deref()
            .map(|p| search(name, "header_pattern", p))
            .transpose()?;
        let scope = match (&spec.block, spec.multi_block) {
            (Some(block), false) => LineScope::Block(compile_block(name, block)?),
            _ => LineScope::Full,
        };
        return Ok(Strategy::Multiline { rules, header, scope });
    }

    if spec.multi_block {
        let (Some(header), Some(item)) = (spec.header_pattern.as_deref(), spec.item_pattern.as_deref())
        else {
            return Err(none("multi_block requires header_pattern and item_pattern"));
        };
        if spec.block.is_some() {
            warn!("Profile '{}': block markers are ignored by the multi_block strategy", name);
        }
        return Ok(Strategy::MultiBlock {
            header: search(name, "header_pattern", header)?,
            item: anchored(name, "item_pattern", item)?,
        });
    }

    let Some(item) = spec.item_pattern.as_deref() else {
        return Err(none("no item_pattern, multiline or table rules"));
    };
    if spec.header_pattern.is_some() {
        warn!("Profile '{}': header_pattern is unused without multi_block", name);
    }
    let block = spec
        .block
        .as_ref()
        .map(|b| compile_block(name, b))
        .transpose()?;

    Ok(Strategy::SingleLine {
        block,
        item: anchored(name, "item_pattern", item)?,
    })
}

fn compile_block(name: &str, block: &BlockSpec) -> Result<BlockRules, ProfileError> {
    Ok(BlockRules {
        start: case_insensitive(name, "block.start", &block.start)?,
        stop: block
            .stop
            .as_deref()
            .map(|p| case_insensitive(name, "block.stop", p))
            .transpose()?,
    })
}

fn compile_multiline(name: &str, spec: &MultilineSpec) -> Result<MultilineRules, ProfileError> {
    Ok(MultilineRules {
        start: anchored(name, "multiline.start_pattern", &spec.start_pattern)?,
        description: spec
            .description_pattern
            .as_deref()
            .map(|p| anchored(name, "multiline.description_pattern", p))
            .transpose()?,
        max_lookahead: spec.max_lookahead_lines,
        code_group: spec.code_group.clone(),
        quantity_group: spec.quantity_group.clone(),
        description_group: spec.description_group.clone(),
        inline_description_group: spec.inline_description_group.clone(),
        boundary_markers: spec.boundary_markers.clone(),
    })
}

fn compile_grid(name: &str, table: &TableSpec, item: &str) -> Result<GridRules, ProfileError> {
    Ok(GridRules {
        item: anchored(name, "item_pattern", item)?,
        header: table.header.clone(),
        fixed_flavor: table.fixed_flavor.clone().filter(|f| !f.is_empty()),
        preferred_flavors: table.preferred_flavors.clone(),
        code_in_description: table
            .code_in_description
            .as_deref()
            .map(|p| search(name, "table.code_in_description", p))
            .transpose()?,
    })
}

fn compile_post_processing(
    name: &str,
    spec: &ProfileSpec,
) -> Result<IndexMap<String, NumericKind>, ProfileError> {
    let post = &spec.post_processing;
    let declared = post
        .integer_fields
        .iter()
        .map(|f| (f, NumericKind::Integer))
        .chain(post.float_fields.iter().map(|f| (f, NumericKind::Float)))
        .chain(post.number_fields.iter().map(|f| (f, NumericKind::Number)));

    let mut fields = IndexMap::new();
    for (field, kind) in declared {
        if let Some(previous) = fields.insert(field.clone(), kind) {
            if previous != kind {
                return Err(ProfileError::ConflictingPostProcessing {
                    profile: name.to_string(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(fields)
}

fn search(profile: &str, field: &'static str, pattern: &str) -> Result<Regex, ProfileError> {
    Regex::new(pattern).map_err(|source| ProfileError::InvalidRegex {
        profile: profile.to_string(),
        field,
        source,
    })
}

fn anchored(profile: &str, field: &'static str, pattern: &str) -> Result<Regex, ProfileError> {
    // validate the pattern on its own first so errors point at the user's text
    search(profile, field, pattern)?;
    search(profile, field, &format!("^(?:{pattern})"))
}

fn case_insensitive(profile: &str, field: &'static str, pattern: &str) -> Result<Regex, ProfileError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ProfileError::InvalidRegex {
            profile: profile.to_string(),
            field,
            source,
        })
}
