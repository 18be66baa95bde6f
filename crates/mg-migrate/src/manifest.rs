//! The potassium → magnesium rewrite manifest.
//!
//! Each target file gets its own ordered [`RuleSet`]. Rules that rename
//! mandatory configuration are marked required and guarded on the presence
//! of their migrated text; everything else no-ops when its pattern is gone.

use mg_rewrite::{Flags, Pattern, Placement, Replacement, Rule, RuleSet};
use std::path::{Path, PathBuf};

pub const PIPELINE_CONFIG: &str = "src/config/pipeline_config.py";
pub const MAIN_PY: &str = "main.py";
pub const CLAUDE_MD: &str = "CLAUDE.md";
pub const PYPROJECT_TOML: &str = "pyproject.toml";

pub const FEATURE_FILES: &[&str] = &[
    "src/features/feature_engineering.py",
    "src/features/enhanced_features.py",
    "src/features/concentration_features.py",
    "src/features/feature_helpers.py",
    "src/features/parallel_feature_engineering.py",
];

/// A file and the rules to run against it.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub rules: RuleSet,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>, rules: RuleSet) -> Self {
        Self {
            path: path.into(),
            rules,
        }
    }
}

/// File tasks in execution order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    tasks: Vec<FileTask>,
}

impl Manifest {
    pub fn new(tasks: Vec<FileTask>) -> Self {
        Self { tasks }
    }

    /// The full migration, with every path resolved against `base_dir`.
    pub fn potassium_to_magnesium(base_dir: &Path) -> mg_rewrite::Result<Self> {
        let mut tasks = vec![FileTask::new(
            base_dir.join(PIPELINE_CONFIG),
            pipeline_config_rules()?,
        )];

        let feature_rules = feature_file_rules();
        tasks.extend(
            FEATURE_FILES
                .iter()
                .map(|rel| FileTask::new(base_dir.join(rel), feature_rules.clone())),
        );

        tasks.push(FileTask::new(base_dir.join(MAIN_PY), main_py_rules()?));
        tasks.push(FileTask::new(base_dir.join(CLAUDE_MD), claude_md_rules()?));
        tasks.push(FileTask::new(
            base_dir.join(PYPROJECT_TOML),
            pyproject_rules()?,
        ));

        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[FileTask] {
        &self.tasks
    }
}

fn literal(name: &str, from: &str, to: &str) -> Rule {
    Rule::replace(name, Pattern::literal(from), to)
}

/// Literal rename that must find its target unless the target is already
/// migrated.
fn required(name: &str, from: &str, to: &str) -> Rule {
    literal(name, from, to)
        .required()
        .when_absent(Pattern::literal(to))
}

fn regex(name: &str, pattern: &str, flags: Flags, to: &str) -> mg_rewrite::Result<Rule> {
    Ok(Rule::replace(
        name,
        Pattern::regex_with(pattern, flags)?,
        Replacement::Text(to.to_string()),
    ))
}

const MG_SPECTRAL_HEADER: &str = "# Literature-verified Magnesium LIBS spectral lines:
    # According to NIST and LIBS literature:
    # - 285.2 nm: Most prominent Mg I line (resonance line)
    # - 383.8 nm: Strong Mg I line
    # - 516.7-518.4 nm: Mg I triplet (516.7, 517.3, 518.4 nm)
    # - 279.5-280.3 nm: Mg II ionic lines (279.55, 279.80, 280.27 nm)

    # Primary magnesium region - Mg I triplet around 517 nm
    magnesium_region:";

const MG_REGION: &str = "magnesium_region: PeakRegion = PeakRegion(
        element=\"Mg_I\", lower_wavelength=516.0, upper_wavelength=519.0, center_wavelengths=[516.7, 517.3, 518.4])";

const K_HELPER_REGION: &str = "\n        PeakRegion(element=\"K_I_help\", lower_wavelength=768.79, upper_wavelength=770.79, center_wavelengths=[769.79]),";

const MG_MACRO_NOTE: &str = "# Note: Primary Mg lines are already defined in magnesium_region and context_regions
        # to avoid duplication. If needed for macro_elements analysis, uncomment below:
        # PeakRegion(element=\"Mg_I_macro\", lower_wavelength=516.0, upper_wavelength=519.0, center_wavelengths=[516.7, 517.3, 518.4]),
        # PeakRegion(element=\"Mg_II_macro\", lower_wavelength=279.0, upper_wavelength=281.0, center_wavelengths=[279.55, 279.80, 280.27]),";

const MG_ONLY_STRATEGY: &str = "if strategy == \"Mg_only\":
            # Only Mg regions + C for Mg_C_ratio
            mg_regions = [self.magnesium_region]
            mg_regions.extend([r for r in self.context_regions if r.element.startswith(\"Mg_I\") or r.element.startswith(\"Mg_II\")])
            # Add C_I for Mg_C_ratio calculation
            c_region = next((r for r in self.context_regions if r.element == \"C_I\"), None)
            if c_region:
                mg_regions.append(c_region)
            return mg_regions";

/// Flag comment rewrites: (old line, new line).
const FEATURE_FLAGS: &[(&str, &str)] = &[
    (
        "enable_molecular_bands: bool = False   # CN/NH/NO bands can indicate organic matter affecting K",
        "enable_molecular_bands: bool = False   # CN/NH/NO bands can indicate organic matter affecting Mg",
    ),
    (
        "enable_macro_elements: bool = True    # S, P, Ca, Mg - critical for K interactions",
        "enable_macro_elements: bool = True    # S, P, Ca, K - critical for Mg interactions",
    ),
    (
        "enable_micro_elements: bool = True    # Fe, Mn, B, Zn - compete with K uptake",
        "enable_micro_elements: bool = True    # Fe, Mn, B, Zn - compete with Mg uptake",
    ),
    (
        "enable_oxygen_hydrogen: bool = True   # H/O ratios affect K compounds",
        "enable_oxygen_hydrogen: bool = False   # H/O ratios affect Mg compounds",
    ),
    (
        "enable_advanced_ratios: bool = True   # K/Ca, K/Mg, K/P ratios are critical",
        "enable_advanced_ratios: bool = True   # Mg/Ca, Mg/K ratios are critical",
    ),
    (
        "enable_spectral_patterns: bool = True # Peak shapes help identify K compounds",
        "enable_spectral_patterns: bool = True # Peak shapes help identify Mg compounds",
    ),
    (
        "enable_interference_correction: bool = True  # Fe/Mn can interfere with K lines",
        "enable_interference_correction: bool = False  # Fe/Mn can interfere with Mg lines",
    ),
];

/// Context lines narrowed back to their nominal widths.
const MG_LINE_WIDTHS: &[(&str, &str)] = &[
    (
        "PeakRegion(element=\"Mg_I_285\", lower_wavelength=283.5, upper_wavelength=286.5, center_wavelengths=[285.2]),  # WIDENED: 1.5→3.0 nm",
        "PeakRegion(element=\"Mg_I_285\", lower_wavelength=284.5, upper_wavelength=286.0, center_wavelengths=[285.2]),",
    ),
    (
        "PeakRegion(element=\"Mg_I_383\", lower_wavelength=382.0, upper_wavelength=385.0, center_wavelengths=[383.8]),  # WIDENED: 1.5→3.0 nm",
        "PeakRegion(element=\"Mg_I_383\", lower_wavelength=383.0, upper_wavelength=384.5, center_wavelengths=[383.8]),",
    ),
    (
        "PeakRegion(element=\"Mg_II\", lower_wavelength=278.0, upper_wavelength=281.5, center_wavelengths=[279.55, 279.80, 280.27]),  # WIDENED: 2.0→3.5 nm (3 peaks)",
        "PeakRegion(element=\"Mg_II\", lower_wavelength=279.0, upper_wavelength=281.0, center_wavelengths=[279.55, 279.80, 280.27]),",
    ),
];

pub fn pipeline_config_rules() -> mg_rewrite::Result<RuleSet> {
    let mut rules = RuleSet::new();

    rules
        .push(required(
            "project name",
            "project_name: str = \"PotassiumPrediction\"",
            "project_name: str = \"MagnesiumPrediction\"",
        ))
        .push(required(
            "target column",
            "target_column: str = \"Potassium\"",
            "target_column: str = \"Magnesium %\"",
        ))
        .push(required(
            "module header",
            "Centralized Configuration Management for the Potassium Prediction ML Pipeline.",
            "Centralized Configuration Management for the Magnesium Prediction ML Pipeline.",
        ))
        .push(literal(
            "concentration range comment",
            "# Based on potassium concentration ranges (typical values)",
            "# Based on magnesium concentration ranges (typical values)",
        ))
        .push(literal("low range", "15% K - low end", "15% Mg - low end"))
        .push(literal("high range", "35% K - high end", "35% Mg - high end"))
        .push(literal("very high range", "45% K - very high", "45% Mg - very high"));

    rules.push(regex(
        "spectral line notes",
        r"# Literature-verified Potassium LIBS spectral lines:.*?# Updated for potassium: K I doublet at 766\.49, 769\.90 nm \(strongest lines\)\s+potassium_region:",
        Flags::DOT_ALL,
        MG_SPECTRAL_HEADER,
    )?);

    // The notes rule above already renamed the key, so accept either spelling.
    rules.push(regex(
        "primary region",
        r#"(?:potassium|magnesium)_region: PeakRegion = PeakRegion\(\s+element="K_I", lower_wavelength=765\.0, upper_wavelength=771\.0, center_wavelengths=\[766\.49, 769\.90\]\)"#,
        Flags::NONE,
        MG_REGION,
    )?);

    rules.push(Rule::delete(
        "additional potassium lines",
        Pattern::regex_with(
            r#"\n[ \t]*# Additional potassium lines.*?PeakRegion\(element="K_I_691".*?\],\),"#,
            Flags::DOT_ALL,
        )?,
    ));

    rules.push(literal(
        "magnesium context comment",
        "# Keep magnesium lines for context and potential interference detection",
        "# Primary magnesium spectral lines",
    ));
    rules.extend(
        MG_LINE_WIDTHS
            .iter()
            .map(|(from, to)| literal("magnesium line width", from, to)),
    );

    rules.push(Rule::delete(
        "phosphorous reference region",
        Pattern::regex(
            r#"\n[ \t]*# Phosphorous region - kept from original pipeline for reference and comparative feature engineering\s+PeakRegion\(element="P_I_secondary".*?\],\),"#,
        )?,
    ));

    rules.push(Rule::insert(
        "potassium helper region",
        Pattern::literal("K_I_help"),
        Pattern::regex(r#"PeakRegion\(element="N_I_help",.*?\],?\),"#)?,
        Placement::After,
        K_HELPER_REGION,
    ));

    rules.push(literal(
        "feature flags header",
        "# Feature configuration flags - OPTIMIZED FOR POTASSIUM",
        "# Feature configuration flags - OPTIMIZED FOR MAGNESIUM",
    ));
    rules.extend(
        FEATURE_FLAGS
            .iter()
            .map(|(from, to)| literal("feature flag", from, to)),
    );

    rules.push(regex(
        "feature method comment",
        r"# Potassium feature generation method\s+use_focused_potassium_features:",
        Flags::NONE,
        "# Magnesium feature generation method\n    use_focused_magnesium_features:",
    )?);
    rules.push(regex(
        "focused feature flag",
        r"use_focused_(?:potassium|magnesium)_features: bool = True  # If True, uses focused features; if False, uses original features",
        Flags::NONE,
        "use_focused_magnesium_features: bool = True  # If True, uses focused features; if False, uses original high-magnesium features",
    )?);

    rules.push(literal(
        "enhanced regions comment",
        "# Enhanced spectral regions for crop potassium prediction",
        "# Enhanced spectral regions for crop magnesium prediction",
    ));

    rules.push(regex(
        "macro element note",
        r#"# Note: Primary K lines.*?# Additional K lines for macro analysis if needed:.*?# PeakRegion\(element="K_I_404_macro".*?\],\),"#,
        Flags::DOT_ALL,
        MG_MACRO_NOTE,
    )?);

    rules.push(regex(
        "single element strategy",
        r#"if strategy == "K_only":.*?# Only K regions \+ C for K_C_ratio\s+k_regions = \[self\.potassium_region\].*?return k_regions"#,
        Flags::DOT_ALL,
        MG_ONLY_STRATEGY,
    )?);

    rules.push(required(
        "all regions",
        "regions = [self.potassium_region] + self.context_regions",
        "regions = [self.magnesium_region] + self.context_regions",
    ));

    rules.push(regex(
        "feature strategies",
        r#"#feature_strategies: List\[str\] = \["K_only", "simple_only", "full_context"\]\s+feature_strategies: List\[str\] = \["K_only"\]"#,
        Flags::NONE,
        "#feature_strategies: List[str] = [\"Mg_only\", \"simple_only\", \"full_context\"]\n    feature_strategies: List[str] = [\"simple_only\"]",
    )?);

    rules
        .push(literal(
            "raw data dir",
            r#"_raw_data_dir=str(BASE_PATH / "data" / "raw" / "newdata")"#,
            r#"_raw_data_dir=str(BASE_PATH / "data" / "raw" / "data_5278_Phase3")"#,
        ))
        .push(literal(
            "reference data path",
            r#"_reference_data_path=str(BASE_PATH / "data" / "reference_data" / "lab_Element_Rough_Nico.xlsx")"#,
            r#"_reference_data_path=str(BASE_PATH / "data" / "reference_data" / "Final_Lab_Data_Nico_New.xlsx")"#,
        ))
        .push(
            literal(
                "raw data dir fallback",
                "return Path(self.__dict__.get('_raw_data_dir', f'{get_base_path()}/data/raw/newdata'))",
                "return Path(self.__dict__.get('_raw_data_dir', f'{get_base_path()}/data/raw/data_5278_Phase3'))",
            )
            .limit(2),
        )
        .push(
            literal(
                "reference data fallback",
                "return Path(self.__dict__.get('_reference_data_path', f'{get_base_path()}/data/reference_data/lab_Element_Rough_Nico.xlsx'))",
                "return Path(self.__dict__.get('_reference_data_path', f'{get_base_path()}/data/reference_data/Final_Lab_Data_Nico_New.xlsx'))",
            )
            .limit(2),
        );

    Ok(rules)
}

/// Identifier and comment renames shared by every feature module. Spectral
/// line names such as `K_I` stay as they are.
pub fn feature_file_rules() -> RuleSet {
    [
        ("K_only", "Mg_only"),
        ("k_only", "mg_only"),
        ("potassium_region", "magnesium_region"),
        (
            "use_focused_potassium_features",
            "use_focused_magnesium_features",
        ),
        ("Potassium-specific", "Magnesium-specific"),
        ("potassium-specific", "magnesium-specific"),
        ("potassium concentration", "magnesium concentration"),
        ("Potassium concentration", "Magnesium concentration"),
        ("K concentration", "Mg concentration"),
        ("K_C_ratio", "Mg_C_ratio"),
        ("K/C", "Mg/C"),
    ]
    .into_iter()
    .map(|(from, to)| literal(from, from, to))
    .collect()
}

pub fn main_py_rules() -> mg_rewrite::Result<RuleSet> {
    [
        (
            "Potassium Prediction ML Pipeline",
            "Magnesium Prediction ML Pipeline",
        ),
        ("potassium prediction", "magnesium prediction"),
        ("Potassium concentration", "Magnesium concentration"),
        ("potassium concentration", "magnesium concentration"),
    ]
    .into_iter()
    .map(|(from, to)| regex(from, from, Flags::CASE_INSENSITIVE, to))
    .collect()
}

pub fn claude_md_rules() -> mg_rewrite::Result<RuleSet> {
    let mut rules = RuleSet::new();
    rules
        .push(regex(
            "project overview",
            "This is a machine learning pipeline for predicting potassium concentration from LIBS",
            Flags::CASE_INSENSITIVE,
            "This is a machine learning pipeline for predicting magnesium concentration from LIBS",
        )?)
        .push(regex(
            "target description",
            "potassium percentage",
            Flags::CASE_INSENSITIVE,
            "magnesium percentage",
        )?)
        .push(regex(
            "single element strategy",
            r"- \*\*K_only\*\*: Focus on potassium spectral regions.*?\)",
            Flags::DOT_ALL,
            "- **Mg_only**: Focus on magnesium spectral regions (516-519nm and 279-286nm)",
        )?)
        .push(literal(
            "feature regions",
            "(766-770nm and 404nm for potassium)",
            "(516-519nm and 279-286nm for magnesium)",
        ));
    Ok(rules)
}

const MG_DESCRIPTION: &str = "description = \"LIBS-based magnesium concentration prediction pipeline\"";

pub fn pyproject_rules() -> mg_rewrite::Result<RuleSet> {
    let mut rules = RuleSet::new();
    rules
        .push(required(
            "package name",
            "name = \"potassium-prediction-pipeline\"",
            "name = \"magnesium-prediction-pipeline\"",
        ))
        .push(
            regex(
                "package description",
                r#"description = ".*?""#,
                Flags::NONE,
                MG_DESCRIPTION,
            )?
            .when_absent(Pattern::literal(MG_DESCRIPTION)),
        );
    Ok(rules)
}
