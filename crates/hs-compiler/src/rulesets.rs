//! HTTPS Everywhere ruleset loader
//!
//! Rulesets are read from the per-site XML files of the rules directory:
//!
//! ```xml
//! <ruleset name="Example">
//!   <target host="example.com" />
//!   <target host="*.example.com" />
//!   <exclusion pattern="^http://example\.com/legacy/" />
//!   <rule from="^http:" to="https:" />
//! </ruleset>
//! ```
//!
//! or from the JSON distribution form, where a file holds either a single
//! ruleset object or an array of them:
//!
//! ```json
//! {
//!   "name": "Example",
//!   "target": ["example.com", "*.example.com"],
//!   "exclusion": ["^http://example\\.com/legacy/"],
//!   "rule": [{ "from": "^http:", "to": "https:" }]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use hs_core::{Exclusion, RegexRewrite, Rule, RuleCollection, Ruleset};

use crate::assemble::LoadOptions;
use crate::error::CompileError;

const STANDARD_FROM: &str = "^http:";
const STANDARD_TO: &str = "https:";
const RULESET_EXTENSIONS: [&str; 2] = ["xml", "json"];

// =============================================================================
// Source Records
// =============================================================================

/// A `from`/`to` rewrite rule as written in the ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleSource {
    #[serde(alias = "@from")]
    pub from: String,
    #[serde(alias = "@to")]
    pub to: String,
}

impl RuleSource {
    /// Whether the rule is the plain `http:` to `https:` upgrade.
    #[inline]
    pub fn is_standard(&self) -> bool {
        self.from == STANDARD_FROM && self.to == STANDARD_TO
    }

    pub fn to_rule(&self) -> Rule {
        if self.is_standard() {
            Rule::StandardUpgrade
        } else {
            Rule::from(RegexRewrite::new(self.from.as_str(), self.to.as_str()))
        }
    }
}

/// Exclusions appear both as bare patterns and as `{ "pattern": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ExclusionSource {
    Pattern(String),
    Object { pattern: String },
}

impl ExclusionSource {
    fn pattern(&self) -> &str {
        match self {
            ExclusionSource::Pattern(pattern) => pattern.as_str(),
            ExclusionSource::Object { pattern } => pattern.as_str(),
        }
    }
}

/// One ruleset as found in the source corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesetSource {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "target")]
    pub targets: Vec<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSource>,
    #[serde(default, rename = "exclusion")]
    exclusions: Vec<ExclusionSource>,
    /// Reason the ruleset is disabled, if it is
    #[serde(default)]
    pub default_off: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl RulesetSource {
    /// Exclusion patterns in source order.
    pub fn exclusions(&self) -> impl Iterator<Item = &str> {
        self.exclusions.iter().map(ExclusionSource::pattern)
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.default_off.is_some()
    }

    /// Combine exclusions and rules into one rule over the declared targets.
    pub fn to_ruleset(&self) -> Ruleset {
        let exclusions = self.exclusions().map(Exclusion::new);
        let rewrites = self.rules.iter().map(RuleSource::to_rule);
        Ruleset::new(&self.targets, Rule::combine(exclusions, rewrites))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceFile {
    Many(Vec<RulesetSource>),
    One(Box<RulesetSource>),
}

// =============================================================================
// XML Form
// =============================================================================

#[derive(Deserialize)]
struct XmlRuleset {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@default_off", default)]
    default_off: Option<String>,
    #[serde(rename = "@platform", default)]
    platform: Option<String>,
    #[serde(rename = "target", default)]
    targets: Vec<XmlTarget>,
    #[serde(rename = "rule", default)]
    rules: Vec<RuleSource>,
    #[serde(rename = "exclusion", default)]
    exclusions: Vec<XmlExclusion>,
}

#[derive(Deserialize)]
struct XmlTarget {
    #[serde(rename = "@host")]
    host: String,
}

#[derive(Deserialize)]
struct XmlExclusion {
    #[serde(rename = "@pattern")]
    pattern: String,
}

impl From<XmlRuleset> for RulesetSource {
    fn from(xml: XmlRuleset) -> Self {
        Self {
            name: xml.name,
            targets: xml.targets.into_iter().map(|target| target.host).collect(),
            rules: xml.rules,
            exclusions: xml
                .exclusions
                .into_iter()
                .map(|exclusion| ExclusionSource::Pattern(exclusion.pattern))
                .collect(),
            default_off: xml.default_off,
            platform: xml.platform,
        }
    }
}

/// Parse one `<ruleset>` document. Elements other than targets, rules and
/// exclusions (tests, secure cookies) are ignored.
pub fn parse_xml_ruleset(text: &str, origin: &str) -> Result<RulesetSource, CompileError> {
    let ruleset: XmlRuleset =
        quick_xml::de::from_str(text).map_err(|e| CompileError::xml(origin, e))?;
    Ok(ruleset.into())
}

/// Parse ruleset text in either form, told apart by its first character.
/// `origin` names the text in error messages.
pub fn parse_rulesets(text: &str, origin: &str) -> Result<Vec<RulesetSource>, CompileError> {
    if text.trim_start().starts_with('<') {
        return Ok(vec![parse_xml_ruleset(text, origin)?]);
    }

    let file: SourceFile = serde_json::from_str(text).map_err(|e| CompileError::json(origin, e))?;
    Ok(match file {
        SourceFile::Many(sources) => sources,
        SourceFile::One(source) => vec![*source],
    })
}

// =============================================================================
// File Scanning
// =============================================================================

/// Lazily reads ruleset files, one file per item.
///
/// Opened on a directory, yields every `*.xml` and `*.json` file in it in
/// file-name order; opened on a file, yields just that file. Not restartable.
pub struct RulesetFiles {
    paths: std::vec::IntoIter<PathBuf>,
}

impl RulesetFiles {
    pub fn open(path: &Path) -> Result<Self, CompileError> {
        let metadata = fs::metadata(path).map_err(|e| CompileError::io(path, e))?;
        if !metadata.is_dir() {
            return Ok(Self {
                paths: vec![path.to_path_buf()].into_iter(),
            });
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| CompileError::io(path, e))? {
            let entry = entry.map_err(|e| CompileError::io(path, e))?;
            let file_path = entry.path();
            let is_ruleset = file_path.is_file()
                && file_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| RULESET_EXTENSIONS.contains(&ext));
            if is_ruleset {
                paths.push(file_path);
            }
        }
        paths.sort();

        Ok(Self {
            paths: paths.into_iter(),
        })
    }
}

impl Iterator for RulesetFiles {
    type Item = Result<(PathBuf, Vec<RulesetSource>), CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        let result = fs::read_to_string(&path)
            .map_err(|e| CompileError::io(&path, e))
            .and_then(|text| parse_rulesets(&text, &format!("'{}'", path.display())))
            .map(|sources| (path, sources));
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Load every ruleset under `path` into a new collection.
///
/// Any unreadable or malformed file fails the whole load.
pub fn load_rulesets(path: &Path, options: &LoadOptions) -> Result<RuleCollection, CompileError> {
    let mut collection = RuleCollection::new();
    let mut files = 0usize;
    let mut loaded = 0usize;
    let mut disabled = 0usize;

    for item in RulesetFiles::open(path)? {
        let (file, sources) = item?;
        files += 1;
        log::debug!("{}: {} rulesets", file.display(), sources.len());

        for source in sources {
            if source.is_disabled() && !options.include_disabled {
                disabled += 1;
                continue;
            }
            collection.add_ruleset(source.to_ruleset());
            loaded += 1;
        }
    }

    log::info!(
        "Rulesets: {} loaded from {} files ({} disabled skipped)",
        loaded,
        files,
        disabled
    );

    Ok(collection)
}
