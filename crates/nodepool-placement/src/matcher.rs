//! Best-match selection over glob-named candidates.
//!
//! Each candidate carries a name pattern plus optional region and domain
//! filters. Selection works in two tiers:
//!
//! 1. **Constraining** candidates are searched first, in full.
//! 2. **Non-constraining** candidates are only considered when no
//!    constraining candidate matches.
//!
//! Within a tier the most specific name pattern wins: a literal name
//! outranks any wildcard, and among wildcards the one with more literal
//! characters wins. Ties keep input order.

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use nodepool_core::{FloatingPool, FloatingPoolRequest};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("no candidate matches {pattern:?} in region {region}")]
    NotFound { pattern: String, region: String },

    #[error("invalid name pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Anything selectable by name pattern, region and domain.
pub trait PatternCandidate {
    fn name_pattern(&self) -> &str;
    fn region(&self) -> Option<&str>;
    fn domain(&self) -> Option<&str>;
    fn non_constraining(&self) -> bool;
}

impl PatternCandidate for FloatingPool {
    fn name_pattern(&self) -> &str {
        &self.name
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    fn non_constraining(&self) -> bool {
        self.non_constraining.unwrap_or(false)
    }
}

/// Specificity of a name match. Ordered: higher is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchScore {
    /// The pattern had no wildcards.
    pub literal: bool,
    /// Characters in the pattern that must match exactly.
    pub literal_chars: usize,
}

// ── Glob ──────────────────────────────────────────────────────────

/// Path-style glob: `*` and `?` never match `/`, `[...]` is a character
/// class (`[^...]` negates), `\` escapes the next character.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
    score: MatchScore,
}

impl Glob {
    pub fn new(pattern: &str) -> MatchResult<Self> {
        let invalid = |reason: &str| MatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        let mut literal = true;
        let mut literal_chars = 0;

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    literal = false;
                    re.push_str("[^/]*");
                }
                '?' => {
                    literal = false;
                    re.push_str("[^/]");
                }
                '[' => {
                    literal = false;
                    re.push('[');
                    let mut closed = false;
                    let mut first = true;
                    for c in chars.by_ref() {
                        match c {
                            ']' if !first => {
                                closed = true;
                                break;
                            }
                            '^' if first => re.push('^'),
                            '\\' | '[' | ']' | '&' | '~' => {
                                re.push('\\');
                                re.push(c);
                            }
                            _ => re.push(c),
                        }
                        first = false;
                    }
                    if !closed {
                        return Err(invalid("unterminated character class"));
                    }
                    re.push(']');
                }
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| invalid("trailing escape"))?;
                    re.push_str(&regex::escape(&escaped.to_string()));
                    literal_chars += 1;
                }
                _ => {
                    re.push_str(&regex::escape(&c.to_string()));
                    literal_chars += 1;
                }
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            regex,
            score: MatchScore {
                literal,
                literal_chars,
            },
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn score(&self) -> MatchScore {
        self.score
    }
}

// ── Selection ─────────────────────────────────────────────────────

/// Score one candidate against the request. `None` when a filter or the
/// name pattern rules it out.
pub fn score_candidate<C: PatternCandidate>(
    candidate: &C,
    name: &str,
    region: &str,
    domain: Option<&str>,
) -> Option<MatchScore> {
    if candidate.region().is_some_and(|r| r != region) {
        return None;
    }
    if let (Some(wanted), Some(offered)) = (domain, candidate.domain()) {
        if wanted != offered {
            return None;
        }
    }

    let glob = match Glob::new(candidate.name_pattern()) {
        Ok(glob) => glob,
        Err(e) => {
            warn!(error = %e, "skipping candidate with invalid pattern");
            return None;
        }
    };
    glob.is_match(name).then(|| glob.score())
}

/// Pick the most specific candidate for `name`.
pub fn find_best_match<'a, C: PatternCandidate>(
    candidates: &'a [C],
    name: &str,
    region: &str,
    domain: Option<&str>,
) -> MatchResult<&'a C> {
    let (constraining, non_constraining): (Vec<&C>, Vec<&C>) =
        candidates.iter().partition(|c| !c.non_constraining());

    for (tier, members) in [("constraining", constraining), ("non-constraining", non_constraining)] {
        let mut best: Option<(&C, MatchScore)> = None;
        for candidate in members {
            let Some(score) = score_candidate(candidate, name, region, domain) else {
                continue;
            };
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        if let Some((candidate, score)) = best {
            debug!(
                tier,
                candidate = candidate.name_pattern(),
                literal = score.literal,
                "selected best match"
            );
            return Ok(candidate);
        }
    }

    Err(MatchError::NotFound {
        pattern: name.to_string(),
        region: region.to_string(),
    })
}

/// Select the floating pool for `request` in `region`.
pub fn select_floating_pool<'a>(
    pools: &'a [FloatingPool],
    request: &FloatingPoolRequest,
    region: &str,
) -> MatchResult<&'a FloatingPool> {
    find_best_match(pools, &request.name, region, request.domain.as_deref())
}
