//! nodepool-placement: where things go.
//!
//! Pure helpers that decide placement-related values without touching
//! any backend.
//!
//! # Components
//!
//! - **`matcher`**: best-match selection over glob-named candidates
//!   (floating IP pools), tiered by constraining / non-constraining
//! - **`zones`**: deterministic distribution of pool counts over zones

pub mod matcher;
pub mod zones;

pub use matcher::{
    Glob, MatchError, MatchResult, MatchScore, PatternCandidate, find_best_match,
    score_candidate, select_floating_pool,
};
pub use zones::{ZoneShare, distribute_int_or_percent, distribute_over_zones, distribute_pool, zone_counts};
