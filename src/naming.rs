//! Method-name normalization and matching.
//!
//! KDF method names appear in several spellings across the documentation workspace:
//!
//! - canonical RPC names: `task::enable_eth::init`
//! - directory and file slugs: `task-enable_eth-init`
//! - URL slugs: `task-enable-eth-init`
//! - display titles: `Komodo DeFi Framework Method: Task → Enable Eth → Init`
//!
//! The functions here convert between those spellings and reconcile names that do not line up
//! exactly, first through known variations and finally through a Levenshtein fallback.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static DISPLAY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(komodo defi framework method|kdf method|api method|method)\s*:\s*")
        .expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NFT_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"nft-([a-z]+)").expect("valid regex"));
static STRUCTURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(task|stream|lightning)(?:::|-)([^:-]+)(?:(?:::|-)(.+))?$")
        .expect("valid regex")
});

/// Underscore compounds that survive a round trip through URL slugs.
const UNDERSCORE_COMPOUNDS: &[(&str, &str)] = &[
    ("enable-utxo", "enable_utxo"),
    ("enable-bch", "enable_bch"),
    ("enable-eth", "enable_eth"),
    ("enable-qtum", "enable_qtum"),
    ("enable-z-coin", "enable_z_coin"),
    ("enable-coin", "enable_coin"),
    ("account-balance", "account_balance"),
    ("new-address", "new_address"),
    ("z-coin", "z_coin"),
    ("close-channel", "close_channel"),
    ("send-payment", "send_payment"),
    ("trusted-node", "trusted_node"),
    ("claimable-balances", "claimable_balances"),
    ("channel-details", "channel_details"),
    ("payment-details", "payment_details"),
];

/// Words kept upper-case (or in their branded spelling) in human titles.
const ACRONYMS: &[&str] = &[
    "KDF", "NFT", "UTXO", "ETH", "BCH", "QTUM", "HD", "ID", "GUI", "RPC", "1inch", "TX", "MTP",
    "IBC", "SLP", "ERC20", "BEP20", "ZHTLC", "MM2",
];

const MINOR_WORDS: &[&str] = &[
    "and", "or", "but", "for", "nor", "on", "at", "to", "from", "by", "of", "in", "with",
];

/// `task::enable_eth::init` -> `task-enable_eth-init`
pub fn method_to_slug(method: &str) -> String {
    method.replace("::", "-")
}

/// Inverse of [`method_to_slug`]. URL-like slugs are left untouched.
pub fn slug_to_method(slug: &str) -> String {
    if slug.starts_with("http-") || slug.starts_with("https-") {
        slug.to_string()
    } else {
        slug.replace('-', "::")
    }
}

/// `task::enable_eth::init` -> `task-enable-eth-init`
pub fn method_to_url_slug(method: &str) -> String {
    method.replace("::", "-").replace('_', "-")
}

/// Best-effort inverse of [`method_to_url_slug`].
///
/// URL slugs lose the distinction between `_` and `::`, so known underscore compounds are
/// restored first and every remaining `-` becomes a namespace separator.
pub fn url_slug_to_method(slug: &str) -> String {
    let mut restored = slug.to_string();
    for (dashed, underscored) in UNDERSCORE_COMPOUNDS {
        restored = restored.replace(dashed, underscored);
    }
    let restored = NFT_SLUG.replace_all(&restored, "nft_$1");
    restored.replace('-', "::")
}

/// Lower-cases a name and forces `::` separators.
pub fn normalize_method_name(method: &str) -> String {
    let mut normalized = method.trim().to_lowercase().replace('-', "::");
    while normalized.contains("::::") {
        normalized = normalized.replace("::::", "::");
    }
    normalized.trim_matches(':').to_string()
}

/// Strips display decoration from a method name as it appears in titles and headings.
pub fn clean_method_name(raw: &str) -> String {
    let stripped = DISPLAY_PREFIX.replace(raw, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    collapsed
        .replace(" → ", "::")
        .replace(" -> ", "::")
        .replace(" | ", "::")
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '(' | ')' | '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Spellings worth trying when an exact lookup fails, original first, without duplicates.
pub fn method_variations(method: &str) -> Vec<String> {
    let cleaned = clean_method_name(method);
    let swapped = if cleaned.contains("::") {
        cleaned.replace("::", "-")
    } else {
        slug_to_method(&cleaned)
    };

    let mut variations: Vec<String> = Vec::with_capacity(3);
    for candidate in [method.to_string(), cleaned, swapped] {
        if !candidate.is_empty() && !variations.contains(&candidate) {
            variations.push(candidate);
        }
    }
    variations
}

/// How a name was reconciled with a candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Direct,
    Variation,
    Fuzzy,
}

/// Result of [`find_best_match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch<'a> {
    pub key: &'a str,
    pub kind: MatchKind,
    /// Edit distance for fuzzy matches, 0 otherwise
    pub distance: usize,
}

/// Finds the candidate that best corresponds to `target`.
///
/// Tiers are tried in order: exact match, a match on one of [`method_variations`] (also compared
/// after [`normalize_method_name`]), then the closest candidate by case-insensitive Levenshtein
/// distance. The fuzzy tier only accepts distances up to a third of the target's length and skips
/// candidates whose length differs by more than that.
///
/// # Arguments
///
/// * `target` - The name to look up
/// * `candidates` - Known names; ties in the fuzzy tier go to the earliest candidate
///
/// # Returns
///
/// The matched candidate with the tier that produced it, or `None`.
///
/// # Example
///
/// ```
/// use kdf_docs_toolkit::naming::{find_best_match, MatchKind};
///
/// let known = ["task::enable_eth::init", "get_enabled_coins"];
/// let found = find_best_match("task-enable_eth-init", known).unwrap();
/// assert_eq!(found.key, "task::enable_eth::init");
/// assert_eq!(found.kind, MatchKind::Variation);
/// ```
pub fn find_best_match<'a, I>(target: &str, candidates: I) -> Option<MethodMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&'a str> = candidates.into_iter().collect();
    if target.is_empty() || candidates.is_empty() {
        return None;
    }

    if let Some(key) = candidates.iter().copied().find(|c| *c == target) {
        return Some(MethodMatch { key, kind: MatchKind::Direct, distance: 0 });
    }

    for variation in method_variations(target) {
        let normalized = normalize_method_name(&variation);
        if let Some(key) = candidates
            .iter()
            .copied()
            .find(|c| *c == variation || normalize_method_name(c) == normalized)
        {
            return Some(MethodMatch { key, kind: MatchKind::Variation, distance: 0 });
        }
    }

    let threshold = target.chars().count() / 3;
    let lowered = target.to_lowercase();
    let mut best: Option<MethodMatch<'a>> = None;
    for candidate in candidates {
        let len_diff = candidate.chars().count().abs_diff(target.chars().count());
        if len_diff > threshold {
            continue;
        }
        let distance = strsim::levenshtein(&lowered, &candidate.to_lowercase());
        if distance <= threshold && best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(MethodMatch { key: candidate, kind: MatchKind::Fuzzy, distance });
        }
    }
    best
}

/// [`find_best_match`] without the fuzzy tier.
///
/// Used for names that are authoritative on their own, such as dispatcher methods, where
/// `task::withdraw::status` must not resolve to a documented `task::withdraw::init`.
pub fn find_exact_match<'a, I>(target: &str, candidates: I) -> Option<MethodMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    find_best_match(target, candidates).filter(|m| m.kind != MatchKind::Fuzzy)
}

/// Tally of how names were matched during a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub direct: usize,
    pub variation: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn record(&mut self, kind: Option<MatchKind>) {
        match kind {
            Some(MatchKind::Direct) => self.direct += 1,
            Some(MatchKind::Variation) => self.variation += 1,
            Some(MatchKind::Fuzzy) => self.fuzzy += 1,
            None => self.unmatched += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.direct + self.variation + self.fuzzy + self.unmatched
    }
}

/// `task::enable_eth::init` -> `task::enable_eth`, `withdraw` -> `withdraw`
pub fn extract_base_method(method: &str) -> String {
    if let Some(caps) = STRUCTURED.captures(method) {
        return format!("{}::{}", caps[1].to_lowercase(), &caps[2]);
    }
    let parts = split_segments(method);
    if parts.len() > 2 {
        parts[..parts.len() - 1].join("::")
    } else {
        method.to_string()
    }
}

/// `task::enable_eth::init` -> `init`; single-segment names have no operation.
pub fn extract_operation(method: &str) -> Option<String> {
    if let Some(caps) = STRUCTURED.captures(method) {
        return caps.get(3).map(|m| m.as_str().to_string());
    }
    let parts = split_segments(method);
    if parts.len() > 2 {
        parts.last().map(|s| s.to_string())
    } else {
        None
    }
}

fn split_segments(method: &str) -> Vec<&str> {
    method
        .split(|c: char| c == ':' || c == '-')
        .filter(|s| !s.is_empty())
        .collect()
}

/// `/v2/task/enable_eth/init`
pub fn api_path(version: &str, method: &str) -> String {
    format!("/{}/{}", version, method.replace("::", "/"))
}

/// Documentation category inferred from a method name alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCategory {
    pub category: String,
    pub subcategory: Option<String>,
}

impl MethodCategory {
    fn new(category: &str, subcategory: Option<&str>) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.map(str::to_string),
        }
    }
}

/// Infers a category for methods that have no documentation page to take one from.
pub fn method_category(method: &str) -> MethodCategory {
    let parts: Vec<&str> = method.split("::").collect();
    let lowered = method.to_lowercase();

    if parts[0] == "task" && parts.len() > 1 {
        let base = parts[1];
        if base.starts_with("enable_") {
            return MethodCategory::new("coin_activation", Some("task_managed"));
        }
        if base == "create_new_account" || base == "withdraw" {
            return MethodCategory::new("wallet", Some("task_managed"));
        }
        return MethodCategory::new("task_managed", Some(base.replace('_', "-").as_str()));
    }
    match parts[0] {
        "lightning" => {
            let sub = if parts.len() > 2 { Some(parts[1]) } else { None };
            return MethodCategory::new("lightning", sub);
        }
        "stream" | "streaming" => return MethodCategory::new("streaming", None),
        "gui_storage" => return MethodCategory::new("gui_storage", None),
        "experimental" if parts.get(1) == Some(&"staking") => {
            return MethodCategory::new("staking", Some("experimental"));
        }
        "wallet" => {
            let sub = if parts.len() > 2 { Some(parts[1]) } else { None };
            return MethodCategory::new("wallet", sub);
        }
        _ => {}
    }
    if ["swap", "order", "trade"].iter().any(|k| lowered.contains(k)) {
        MethodCategory::new("trading", None)
    } else if lowered.contains("nft") {
        MethodCategory::new("nft", None)
    } else if lowered.contains("1inch") {
        MethodCategory::new("integrations", Some("1inch"))
    } else {
        MethodCategory::new("misc", None)
    }
}

/// `task::enable_eth::init` -> `Task → Enable Eth → Init`
pub fn display_title(method: &str) -> String {
    method
        .split("::")
        .map(|part| {
            part.split('_')
                .filter(|w| !w.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Title-cases snake_case or spaced text, keeping acronyms and minor words intact.
///
/// `enable_eth_with_tokens` -> `Enable ETH with Tokens`
pub fn human_title(text: &str) -> String {
    text.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .enumerate()
        .map(|(i, word)| {
            if let Some(acronym) = ACRONYMS.iter().find(|a| a.eq_ignore_ascii_case(word)) {
                acronym.to_string()
            } else if i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str()) {
                word.to_lowercase()
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Cuts `text` to at most `max_len` characters, ending with `...` when shortened.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
