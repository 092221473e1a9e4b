//! Candidate scoring and ranking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{CoachCandidate, RankedCandidate};

/// Weights of the match score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Added once when the coach is active.
    pub active_bonus: f64,
    /// Added per wanted specialty the coach has.
    pub specialty_weight: f64,
    /// Multiplies the coach's average rating.
    pub rating_weight: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            active_bonus: 10.0,
            specialty_weight: 2.0,
            rating_weight: 1.0,
        }
    }
}

/// Score `candidate` against the wanted specialties; higher is better.
pub fn score(candidate: &CoachCandidate, wanted: &[String], weights: &MatchWeights) -> f64 {
    let have: HashSet<String> = candidate
        .specialties
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let overlap = wanted
        .iter()
        .map(|s| s.to_lowercase())
        .collect::<HashSet<_>>()
        .intersection(&have)
        .count();
    let active = if candidate.active { weights.active_bonus } else { 0.0 };
    #[allow(clippy::cast_precision_loss)]
    let overlap = overlap as f64;
    active + weights.specialty_weight * overlap + weights.rating_weight * candidate.past_rating_average
}

/// Rank reachable candidates by score, ties broken by ascending coach id.
///
/// Candidates without a contact channel are dropped; repeated ids keep
/// their first occurrence.
pub fn rank(
    candidates: Vec<CoachCandidate>,
    wanted: &[String],
    weights: &MatchWeights,
) -> Vec<RankedCandidate> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .filter_map(|c| {
            let Some(channel) = c.preferred_channel() else {
                tracing::warn!(coach = %c.id, "candidate has no contact channel; skipped");
                return None;
            };
            Some(RankedCandidate {
                score: score(&c, wanted, weights),
                coach_id: c.id,
                channel,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.coach_id.cmp(&b.coach_id))
    });
    ranked
}
