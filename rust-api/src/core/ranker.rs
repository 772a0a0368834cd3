//! Outcome ranking
//!
//! Scores every ordered trifecta (120 permutations of 3 out of 6 boats) from
//! a per-boat likelihood vector, with tier-specific position weights.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::odds::trifecta_key;
use crate::predictor::Likelihoods;

/// Total ordered triples of distinct boats
pub const NUM_COMBINATIONS: usize = 120;

/// Prediction tiers (本命 / 中穴 / 大穴)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Favorite,
    Balanced,
    LongShot,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Favorite, Tier::Balanced, Tier::LongShot];

    /// Weights on the likelihoods of first, second and third place
    pub fn weights(self) -> [f64; 3] {
        match self {
            Tier::Favorite => [1.5, 0.5, 0.3],
            Tier::Balanced => [1.0, 0.8, 0.6],
            Tier::LongShot => [0.8, 1.0, 0.9],
        }
    }

    /// Candidates kept after ranking
    pub fn keep(self) -> usize {
        match self {
            Tier::Favorite => 5,
            Tier::Balanced => 10,
            Tier::LongShot => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Favorite => "favorite",
            Tier::Balanced => "balanced",
            Tier::LongShot => "long_shot",
        }
    }
}

/// Ranked trifecta outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Courses in finishing order
    pub boats: [u8; 3],
    pub score: f64,
    /// Score as a percentage, clamped to [30, 95]
    pub confidence: u8,
}

impl Candidate {
    pub fn new(boats: [u8; 3], score: f64) -> Self {
        Self {
            boats,
            score,
            confidence: confidence(score),
        }
    }

    /// Trifecta odds key ("1-2-3")
    pub fn key(&self) -> String {
        trifecta_key(self.boats[0], self.boats[1], self.boats[2])
    }
}

fn confidence(score: f64) -> u8 {
    let pct = score * 100.0;
    if pct.is_nan() {
        return 30;
    }
    pct.clamp(30.0, 95.0) as u8
}

/// Ranked candidates for all three tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierCandidates {
    pub favorite: Vec<Candidate>,
    pub balanced: Vec<Candidate>,
    pub long_shot: Vec<Candidate>,
}

impl TierCandidates {
    pub fn get(&self, tier: Tier) -> &[Candidate] {
        match tier {
            Tier::Favorite => &self.favorite,
            Tier::Balanced => &self.balanced,
            Tier::LongShot => &self.long_shot,
        }
    }
}

pub struct OutcomeRanker;

impl OutcomeRanker {
    /// All ordered triples of distinct courses in lexicographic order
    pub fn enumerate() -> Vec<[u8; 3]> {
        let mut combos = Vec::with_capacity(NUM_COMBINATIONS);
        for first in 1..=6u8 {
            for second in 1..=6u8 {
                if second == first {
                    continue;
                }
                for third in 1..=6u8 {
                    if third == first || third == second {
                        continue;
                    }
                    combos.push([first, second, third]);
                }
            }
        }
        combos
    }

    /// Score all 120 outcomes for a tier, best first
    ///
    /// The sort is stable so equal scores keep enumeration order.
    pub fn rank_all(likelihoods: &Likelihoods, tier: Tier) -> Vec<Candidate> {
        let [w1, w2, w3] = tier.weights();
        let p = |course: u8| likelihoods[(course - 1) as usize];

        let mut candidates: Vec<Candidate> = Self::enumerate()
            .into_iter()
            .map(|boats| {
                let score = w1 * p(boats[0]) + w2 * p(boats[1]) + w3 * p(boats[2]);
                Candidate::new(boats, score)
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Top candidates for a tier
    pub fn rank(likelihoods: &Likelihoods, tier: Tier) -> Vec<Candidate> {
        let mut candidates = Self::rank_all(likelihoods, tier);
        candidates.truncate(tier.keep());
        if let Some(top) = candidates.first() {
            debug!("{} top: {} ({:.4})", tier.as_str(), top.key(), top.score);
        }
        candidates
    }

    /// Top candidates for every tier
    pub fn rank_tiers(likelihoods: &Likelihoods) -> TierCandidates {
        TierCandidates {
            favorite: Self::rank(likelihoods, Tier::Favorite),
            balanced: Self::rank(likelihoods, Tier::Balanced),
            long_shot: Self::rank(likelihoods, Tier::LongShot),
        }
    }
}
