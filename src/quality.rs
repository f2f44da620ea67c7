//! Compares generated MDX drafts with their hand-edited live pages and reports what the
//! generator gets wrong.

use crate::config::TITLE_PREFIX;
use crate::scanner::FileScanner;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static METHOD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## ([a-zA-Z_:]+)").expect("valid regex"));
static API_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tag\s*:\s*'([^']+)'").expect("valid regex"));
static MAIN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));
static REQUEST_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^### Request Parameters?\s*$").expect("valid regex"));
static RESPONSE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^### Response Parameters?\s*$").expect("valid regex"));
static EXAMPLES_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#### 📌 Examples?\s*$").expect("valid regex"));
static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"^export const title = "{}.+";$"#, regex::escape(TITLE_PREFIX)))
        .expect("valid regex")
});
static DESCRIPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^export const description = "(.+)";$"#).expect("valid regex"));
static METHOD_HEADING_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^## [a-zA-Z_:]").expect("valid regex"));
static METHOD_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^## [a-zA-Z_:]+.*\{\{label\s*:\s*'[^']+'\s*,\s*tag\s*:\s*'[^']+'\}\}$")
        .expect("valid regex")
});
static TABLE_HEADERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"\|\s*Parameter\s*\|\s*Type\s*\|\s*Required\s*\|\s*Default\s*\|\s*Description\s*\|",
        r"\|\s*Parameter\s*\|\s*Type\s*\|\s*Required\s*\|\s*Description\s*\|",
        r"\|\s*Parameter\s*\|\s*Type\s*\|\s*Description\s*\|",
    ]
    .map(|p| Regex::new(p).expect("valid regex"))
});

pub const USERPASS: &str = "RPC_UserP@SSW0RD";

/// Sections below this similarity are reported.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

const EXCERPT_LEN: usize = 200;

/// Named sections of a page.
///
/// `method_name`, `api_version`, `human_title`, `request_params`, `response_params` and
/// `examples` are always present (possibly empty). Every `#`, `##` and `###` heading also starts
/// a `full_*` section holding the heading and the lines under it.
pub fn extract_sections(content: &str) -> BTreeMap<String, String> {
    let mut sections = BTreeMap::new();
    let capture = |re: &Regex| {
        re.captures(content)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default()
    };
    sections.insert("method_name".to_string(), capture(&METHOD_NAME));
    sections.insert("api_version".to_string(), capture(&API_TAG));
    sections.insert("human_title".to_string(), capture(&MAIN_HEADING));
    sections.insert("request_params".to_string(), block_after(content, &REQUEST_HEADING, true));
    sections.insert("response_params".to_string(), block_after(content, &RESPONSE_HEADING, true));
    sections.insert("examples".to_string(), block_after(content, &EXAMPLES_HEADING, false));

    let mut current: Option<(String, Vec<&str>)> = None;
    for line in content.lines() {
        let key = if line.starts_with("# ") {
            Some("main_content".to_string())
        } else if line.starts_with("## ") {
            Some("method_content".to_string())
        } else if let Some(title) = line.strip_prefix("### ") {
            Some(subsection_key(title))
        } else {
            None
        };
        match key {
            Some(key) => {
                if let Some((name, lines)) = current.take() {
                    store_section(&mut sections, name, &lines);
                }
                current = Some((key, vec![line]));
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    if let Some((name, lines)) = current {
        store_section(&mut sections, name, &lines);
    }
    sections
}

fn subsection_key(title: &str) -> String {
    if title.contains("Request Parameter") {
        return "request_params".to_string();
    }
    if title.contains("Response Parameter") {
        return "response_params".to_string();
    }
    if title.contains("Error Types") {
        return "error_types".to_string();
    }
    let key: String = title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let key = key.split('_').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("_");
    if key.is_empty() {
        "other_section".to_string()
    } else {
        key
    }
}

fn store_section(sections: &mut BTreeMap<String, String>, name: String, lines: &[&str]) {
    let body = lines.join("\n");
    sections
        .entry(format!("full_{}", name))
        .and_modify(|existing| {
            existing.push('\n');
            existing.push_str(&body);
        })
        .or_insert(body);
}

/// Text under the first line matching `heading`, up to the next `###`/`####` heading (or the
/// next JSX element when `stop_at_jsx`).
fn block_after(content: &str, heading: &Regex, stop_at_jsx: bool) -> String {
    let mut lines = content.lines();
    if !lines.by_ref().any(|l| heading.is_match(l)) {
        return String::new();
    }
    let block: Vec<&str> = lines
        .take_while(|l| !(l.starts_with("###") || (stop_at_jsx && l.starts_with('<'))))
        .collect();
    block.join("\n").trim().to_string()
}

/// Similarity of two texts in `[0, 1]`, from the Levenshtein distance over their lines.
///
/// Single-line texts are compared character by character. Two empty texts are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_lines: Vec<&str> = a.lines().collect();
    let b_lines: Vec<&str> = b.lines().collect();
    if a_lines.len() <= 1 && b_lines.len() <= 1 {
        return strsim::normalized_levenshtein(a.trim(), b.trim());
    }
    let longest = a_lines.len().max(b_lines.len());
    let distance = strsim::generic_levenshtein(&a_lines, &b_lines);
    1.0 - distance as f64 / longest as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    fn from_similarity(similarity: f64) -> Self {
        if similarity < 0.3 {
            Severity::Critical
        } else if similarity < 0.6 {
            Severity::Major
        } else {
            Severity::Minor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    Structure,
    Content,
    Parameters,
    Examples,
    ErrorHandling,
    Metadata,
    Style,
    FileAccess,
}

impl DifferenceKind {
    /// Kind of a content difference, judged by the section name.
    fn for_section(section: &str) -> Self {
        let section = section.to_lowercase();
        if section.contains("param") {
            DifferenceKind::Parameters
        } else if section.contains("example") {
            DifferenceKind::Examples
        } else if section.contains("error") {
            DifferenceKind::ErrorHandling
        } else if section.contains("title") || section.contains("description") {
            DifferenceKind::Metadata
        } else if section.contains("heading") {
            DifferenceKind::Structure
        } else {
            DifferenceKind::Content
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifferenceKind::Structure => "structure",
            DifferenceKind::Content => "content",
            DifferenceKind::Parameters => "parameters",
            DifferenceKind::Examples => "examples",
            DifferenceKind::ErrorHandling => "error_handling",
            DifferenceKind::Metadata => "metadata",
            DifferenceKind::Style => "style",
            DifferenceKind::FileAccess => "file_access",
        }
    }

    fn suggestions(&self) -> &'static [&'static str] {
        match self {
            DifferenceKind::Parameters => &[
                "Review parameter extraction logic",
                "Verify parameter types and requirements",
            ],
            DifferenceKind::Examples => &[
                "Update example generation logic",
                "Add more realistic example data",
            ],
            DifferenceKind::Metadata => &[
                "Review method name humanization logic",
                "Check title format compliance",
            ],
            _ => &["Review content generation logic for this section"],
        }
    }
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way in which a draft differs from its live page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    pub section: String,
    pub kind: DifferenceKind,
    pub severity: Severity,
    pub description: String,
    pub generated_excerpt: String,
    pub live_excerpt: String,
    pub line: Option<usize>,
    pub suggestions: Vec<String>,
}

fn excerpt(text: &str) -> String {
    crate::naming::truncate(text, EXCERPT_LEN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleRule {
    TitleFormat,
    DescriptionFormat,
    MethodHeading,
    TableHeader,
    UserpassValue,
}

impl StyleRule {
    fn section(&self) -> &'static str {
        match self {
            StyleRule::TitleFormat | StyleRule::DescriptionFormat => "metadata",
            StyleRule::MethodHeading => "headings",
            StyleRule::TableHeader => "tables",
            StyleRule::UserpassValue => "examples",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            StyleRule::TitleFormat | StyleRule::DescriptionFormat | StyleRule::MethodHeading => {
                Severity::Major
            }
            StyleRule::TableHeader | StyleRule::UserpassValue => Severity::Minor,
        }
    }

    fn expected(&self) -> String {
        match self {
            StyleRule::TitleFormat => {
                format!("export const title = \"{}[Method Title]\";", TITLE_PREFIX)
            }
            StyleRule::DescriptionFormat => {
                "export const description = \"[Sentence ending with a period.]\";".to_string()
            }
            StyleRule::MethodHeading => {
                "## method_name {{label : 'method_name', tag : 'API-v2'}}".to_string()
            }
            StyleRule::TableHeader => {
                "| Parameter | Type | Required | Default | Description |".to_string()
            }
            StyleRule::UserpassValue => format!("userpass should be {}", USERPASS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleViolation {
    pub rule: StyleRule,
    pub message: String,
    /// 1-based line, when the violation is tied to one
    pub line: Option<usize>,
    pub text: String,
}

/// Checks a page against the docs style guide.
#[derive(Debug, Default)]
pub struct StyleValidator;

impl StyleValidator {
    pub fn validate(&self, content: &str) -> Vec<StyleViolation> {
        let mut violations = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let find = |prefix: &str| {
            lines
                .iter()
                .enumerate()
                .find(|(_, l)| l.starts_with(prefix))
                .map(|(i, l)| (i + 1, *l))
        };

        if let Some((line, text)) = find("export const title") {
            if !TITLE_LINE.is_match(text) {
                violations.push(StyleViolation {
                    rule: StyleRule::TitleFormat,
                    message: format!("Title must start with '{}'", TITLE_PREFIX.trim_end()),
                    line: Some(line),
                    text: text.to_string(),
                });
            }
        }

        if let Some((line, text)) = find("export const description") {
            let well_formed = DESCRIPTION_LINE
                .captures(text)
                .map_or(false, |c| c[1].trim_end().ends_with('.'));
            if !well_formed {
                violations.push(StyleViolation {
                    rule: StyleRule::DescriptionFormat,
                    message: "Description must be a quoted sentence ending with a period".to_string(),
                    line: Some(line),
                    text: text.to_string(),
                });
            }
        }

        match lines.iter().enumerate().find(|(_, l)| METHOD_HEADING_START.is_match(l)) {
            Some((i, text)) if !METHOD_HEADING.is_match(text) => violations.push(StyleViolation {
                rule: StyleRule::MethodHeading,
                message: "Method heading must carry a label and tag".to_string(),
                line: Some(i + 1),
                text: text.to_string(),
            }),
            Some(_) => {}
            None => violations.push(StyleViolation {
                rule: StyleRule::MethodHeading,
                message: "No method heading found".to_string(),
                line: None,
                text: String::new(),
            }),
        }

        for (i, text) in lines.iter().enumerate() {
            if text.contains("| Parameter") && !TABLE_HEADERS.iter().any(|re| re.is_match(text)) {
                violations.push(StyleViolation {
                    rule: StyleRule::TableHeader,
                    message: "Parameter table header must start with 'Parameter | Type'".to_string(),
                    line: Some(i + 1),
                    text: text.to_string(),
                });
            }
        }

        if content.to_lowercase().contains("userpass") && !content.contains(USERPASS) {
            violations.push(StyleViolation {
                rule: StyleRule::UserpassValue,
                message: format!("Examples must use the userpass {}", USERPASS),
                line: lines.iter().position(|l| l.contains("userpass")).map(|i| i + 1),
                text: String::new(),
            });
        }

        violations
    }
}

impl From<StyleViolation> for Difference {
    fn from(violation: StyleViolation) -> Self {
        Difference {
            section: violation.rule.section().to_string(),
            kind: DifferenceKind::Style,
            severity: violation.rule.severity(),
            description: violation.message,
            generated_excerpt: violation.text,
            live_excerpt: violation.rule.expected(),
            line: violation.line,
            suggestions: Vec::new(),
        }
    }
}

/// Result of comparing one draft with its live page.
#[derive(Debug, Clone, Serialize)]
pub struct DraftComparison {
    pub method_name: String,
    pub generated_file: PathBuf,
    pub live_file: PathBuf,
    pub similarity: f64,
    pub differences: Vec<Difference>,
    /// Sections of the live page the draft lacks
    pub missing_sections: Vec<String>,
}

impl DraftComparison {
    pub fn count(&self, severity: Severity) -> usize {
        self.differences.iter().filter(|d| d.severity == severity).count()
    }

    /// High-level fixes suggested by the differences of this page.
    pub fn improvement_opportunities(&self) -> Vec<String> {
        let mut by_kind: BTreeMap<DifferenceKind, usize> = BTreeMap::new();
        for diff in &self.differences {
            *by_kind.entry(diff.kind).or_default() += 1;
        }
        let mut opportunities: Vec<String> = by_kind
            .into_iter()
            .filter(|(_, n)| *n >= 3)
            .map(|(kind, _)| format!("Review {} handling", kind))
            .collect();
        if self.count(Severity::Critical) > 0 {
            opportunities.push("Address critical issues immediately".to_string());
        }
        if self.count(Severity::Major) > 2 {
            opportunities.push("Focus on major improvements".to_string());
        }
        opportunities
    }

    pub fn template_issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .missing_sections
            .iter()
            .map(|s| format!("Template lacks section '{}'", s))
            .collect();
        if self.differences.iter().any(|d| d.kind == DifferenceKind::Metadata) {
            issues.push("Template metadata format needs review".to_string());
        }
        issues
    }

    pub fn style_violations(&self) -> Vec<String> {
        self.differences
            .iter()
            .filter(|d| d.kind == DifferenceKind::Style)
            .map(|d| format!("{}: {}", d.section, d.description))
            .collect()
    }
}

/// Compares a draft with its live page.
pub fn compare(generated: &str, live: &str) -> DraftComparison {
    let generated_sections = extract_sections(generated);
    let live_sections = extract_sections(live);
    let mut differences = Vec::new();

    let generated_keys: BTreeSet<&String> = generated_sections.keys().collect();
    let live_keys: BTreeSet<&String> = live_sections.keys().collect();

    let missing_sections: Vec<String> =
        live_keys.difference(&generated_keys).map(|k| k.to_string()).collect();
    for key in &missing_sections {
        differences.push(Difference {
            section: "structure".to_string(),
            kind: DifferenceKind::Structure,
            severity: Severity::Major,
            description: format!("Section '{}' is missing from the draft", key),
            generated_excerpt: String::new(),
            live_excerpt: excerpt(&live_sections[key]),
            line: None,
            suggestions: vec![format!("Add a {} section to the draft template", key)],
        });
    }
    for key in generated_keys.difference(&live_keys) {
        differences.push(Difference {
            section: "structure".to_string(),
            kind: DifferenceKind::Structure,
            severity: Severity::Minor,
            description: format!("Extra section '{}' in the draft", key),
            generated_excerpt: excerpt(&generated_sections[*key]),
            live_excerpt: String::new(),
            line: None,
            suggestions: vec!["Drop the section from the template if it adds nothing".to_string()],
        });
    }

    for key in generated_keys.intersection(&live_keys) {
        let (gen, live) = (&generated_sections[*key], &live_sections[*key]);
        if gen.is_empty() && live.is_empty() {
            continue;
        }
        let score = similarity(gen, live);
        if score < SIMILARITY_THRESHOLD {
            let kind = DifferenceKind::for_section(key);
            differences.push(Difference {
                section: key.to_string(),
                kind,
                severity: Severity::from_similarity(score),
                description: format!("Content difference in {} (similarity: {:.2}%)", key, score * 100.0),
                generated_excerpt: excerpt(gen),
                live_excerpt: excerpt(live),
                line: None,
                suggestions: kind.suggestions().iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    differences.extend(StyleValidator.validate(generated).into_iter().map(Difference::from));

    DraftComparison {
        method_name: generated_sections["method_name"].clone(),
        generated_file: PathBuf::new(),
        live_file: PathBuf::new(),
        similarity: similarity(generated, live),
        differences,
        missing_sections,
    }
}

/// Reads and compares a draft/live pair. Unreadable files yield a comparison holding a single
/// critical difference.
pub fn compare_files(generated_file: &Path, live_file: &Path) -> DraftComparison {
    info!("Analyzing {} vs {}", generated_file.display(), live_file.display());
    let read = |path: &Path, which: &str| {
        fs::read_to_string(path).map_err(|e| format!("Could not read {} file {}: {}", which, path.display(), e))
    };
    let contents = read(generated_file, "generated").and_then(|g| read(live_file, "live").map(|l| (g, l)));

    let mut comparison = match contents {
        Ok((generated, live)) => compare(&generated, &live),
        Err(message) => {
            warn!("{}", message);
            DraftComparison {
                method_name: String::new(),
                generated_file: PathBuf::new(),
                live_file: PathBuf::new(),
                similarity: 0.0,
                differences: vec![Difference {
                    section: "file_access".to_string(),
                    kind: DifferenceKind::FileAccess,
                    severity: Severity::Critical,
                    description: message,
                    generated_excerpt: String::new(),
                    live_excerpt: String::new(),
                    line: None,
                    suggestions: Vec::new(),
                }],
                missing_sections: Vec::new(),
            }
        }
    };
    if comparison.method_name.is_empty() {
        comparison.method_name = generated_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    comparison.generated_file = generated_file.to_path_buf();
    comparison.live_file = live_file.to_path_buf();
    comparison
}

/// Pairs every draft under `generated_dir` with its live page.
///
/// For a draft at `rel`, the live page is looked up as `rel`, then `rel/index.mdx` (extension
/// dropped), then `index.mdx` next to `rel`. Drafts with no live page are skipped.
pub fn pair_files(generated_dir: &Path, live_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let scan = FileScanner::new(generated_dir.to_path_buf()).with_extensions(&["mdx"]).scan()?;
    let mut pairs = Vec::new();
    for generated in scan.files {
        let Ok(rel) = generated.strip_prefix(generated_dir) else { continue };
        let candidates = [
            live_dir.join(rel),
            live_dir.join(rel.with_extension("")).join("index.mdx"),
            live_dir.join(rel.with_file_name("index.mdx")),
        ];
        match candidates.into_iter().find(|c| c.is_file()) {
            Some(live) => pairs.push((generated, live)),
            None => debug!("No live page for draft {}", rel.display()),
        }
    }
    info!("Paired {} drafts with live pages", pairs.len());
    Ok(pairs)
}

/// Aggregated findings over many comparisons.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub comparisons: Vec<DraftComparison>,
    /// Opportunity and the number of pages it affects, most common first
    pub improvement_opportunities: Vec<(String, usize)>,
    pub template_issues: Vec<(String, usize)>,
    pub style_violations: Vec<(String, usize)>,
}

fn count_desc(items: impl IntoIterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

impl QualityReport {
    pub fn build(comparisons: Vec<DraftComparison>) -> Self {
        let improvement_opportunities =
            count_desc(comparisons.iter().flat_map(|c| c.improvement_opportunities()));
        let template_issues = count_desc(comparisons.iter().flat_map(|c| c.template_issues()));
        let style_violations = count_desc(comparisons.iter().flat_map(|c| c.style_violations()));
        Self {
            generated_at: Utc::now(),
            comparisons,
            improvement_opportunities,
            template_issues,
            style_violations,
        }
    }

    pub fn average_similarity(&self) -> f64 {
        if self.comparisons.is_empty() {
            return 0.0;
        }
        self.comparisons.iter().map(|c| c.similarity).sum::<f64>() / self.comparisons.len() as f64
    }

    fn total(&self, severity: Severity) -> usize {
        self.comparisons.iter().map(|c| c.count(severity)).sum()
    }
}

const RECOMMENDATIONS: &str = "## Actionable Recommendations

### Immediate Actions

1. **Fix critical issues** - These prevent proper documentation functionality
2. **Review file generation process** - Critical issues suggest fundamental problems

### Template Improvements

1. **Update base templates** based on common structural differences found
2. **Add validation** for required sections and formats
3. **Enhance metadata generation** to match style guide requirements

### Generation Logic Improvements

1. **Improve content extraction** from source materials
2. **Enhance example generation** with more realistic data
3. **Add style guide validation** during generation process
";

/// Markdown rendering of a [`QualityReport`].
pub fn render_markdown(report: &QualityReport) -> String {
    let mut out = vec![
        "# Documentation Draft Quality Analysis Report".to_string(),
        String::new(),
        format!("**Generated:** {}", report.generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("**Analyzed:** {} document pairs", report.comparisons.len()),
        String::new(),
        "## Executive Summary".to_string(),
        String::new(),
    ];
    if report.comparisons.is_empty() {
        out.push("No reports to analyze.".to_string());
        return out.join("\n") + "\n";
    }

    let total_differences: usize = report.comparisons.iter().map(|c| c.differences.len()).sum();
    out.extend([
        format!("- **Overall Similarity:** {:.1}%", report.average_similarity() * 100.0),
        format!("- **Total Differences Found:** {}", total_differences),
        format!("- **Critical Issues:** {}", report.total(Severity::Critical)),
        format!("- **Major Issues:** {}", report.total(Severity::Major)),
        format!("- **Minor Issues:** {}", report.total(Severity::Minor)),
        String::new(),
    ]);

    if !report.improvement_opportunities.is_empty() {
        out.push("## Top Improvement Opportunities".to_string());
        out.push(String::new());
        for (i, (opportunity, n)) in report.improvement_opportunities.iter().take(5).enumerate() {
            out.push(format!("{}. {} (affects {} documents)", i + 1, opportunity, n));
        }
        out.push(String::new());
    }

    if !report.template_issues.is_empty() {
        out.push("## Template Issues".to_string());
        out.push(String::new());
        for (issue, n) in &report.template_issues {
            out.push(format!("- {} (affects {} documents)", issue, n));
        }
        out.push(String::new());
    }

    if !report.style_violations.is_empty() {
        out.push("## Style Guide Violations".to_string());
        out.push(String::new());
        for (violation, n) in report.style_violations.iter().take(10) {
            out.push(format!("- {} (occurs {} times)", violation, n));
        }
        out.push(String::new());
    }

    out.push("## Detailed Analysis".to_string());
    out.push(String::new());
    let mut comparisons: Vec<&DraftComparison> = report.comparisons.iter().collect();
    comparisons.sort_by(|a, b| a.similarity.total_cmp(&b.similarity));
    for comparison in comparisons {
        out.extend(document_section(comparison));
    }

    out.push(RECOMMENDATIONS.to_string());
    out.join("\n")
}

fn document_section(comparison: &DraftComparison) -> Vec<String> {
    let mut lines = vec![
        format!("### {}", comparison.method_name),
        String::new(),
        format!(
            "**Similarity:** {:.1}% | **Issues:** {}",
            comparison.similarity * 100.0,
            comparison.differences.len()
        ),
        String::new(),
    ];
    let of = |severity: Severity| {
        comparison.differences.iter().filter(move |d| d.severity == severity).collect::<Vec<_>>()
    };
    for (label, severity) in [("Critical", Severity::Critical), ("Major", Severity::Major)] {
        let diffs = of(severity);
        if !diffs.is_empty() {
            lines.push(format!("**{} Issues:**", label));
            lines.extend(diffs.iter().map(|d| format!("- {}: {}", d.section, d.description)));
            lines.push(String::new());
        }
    }
    let minor = of(Severity::Minor);
    if minor.len() > 5 {
        lines.push(format!("**Minor Issues:** {} issues (details omitted)", minor.len()));
        lines.push(String::new());
    } else if !minor.is_empty() {
        lines.push("**Minor Issues:**".to_string());
        lines.extend(minor.iter().map(|d| format!("- {}: {}", d.section, d.description)));
        lines.push(String::new());
    }
    lines
}
