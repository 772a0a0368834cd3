//! Ticket optimization
//!
//! Turns ranked candidates and odds into concrete tickets. The strategy is
//! chosen by the stability score alone:
//! - stable: one trifecta on the top favorite plus a trio hedge
//! - mixed: top 3 balanced trifectas plus exacta from course 1
//! - upset: positive expected-value long shots, or skip

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{MIXED_THRESHOLD, STABLE_THRESHOLD};
use super::ranker::{Candidate, Tier, TierCandidates};
use crate::data::odds::{exacta_key, trio_key, OddsTable};

const STABLE_MAIN_STAKE: u32 = 2500;
const STABLE_HEDGE_STAKE: u32 = 500;
const HEDGE_BOOST: f64 = 1.2;

const MIXED_TRIFECTA_STAKE: u32 = 800;
const MIXED_TRIFECTA_COUNT: usize = 3;
const MIXED_AXIS: u8 = 1;
const MIXED_EXACTA_STAKE: u32 = 120;

const UPSET_STAKE: u32 = 200;
/// Budget reported for an upset race whenever any ticket is bought
const UPSET_TOTAL_STAKE: u32 = 2000;
const UPSET_POOL: usize = 15;
const UPSET_MAX_TICKETS: usize = 10;

/// Candidate scores are spread over three places
fn hit_probability(candidate: &Candidate) -> f64 {
    candidate.score / 3.0
}

/// Trifecta odds for a candidate, 0 when not quoted
fn quoted_trifecta(odds: &OddsTable, candidate: &Candidate) -> f64 {
    let [first, second, third] = candidate.boats;
    odds.get_trifecta(first, second, third).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    /// 3連単
    Trifecta,
    /// 3連複
    Trio,
    /// 2連単
    Exacta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub bet_type: BetType,
    pub combination: String,
    pub stake: u32,
    pub odds: f64,
    /// Probability-weighted payout; not estimated for axis exacta tickets
    pub expected_return: Option<f64>,
    pub purpose: String,
}

/// Tickets for one race and the figures behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub tier: Tier,
    pub label: String,
    pub tickets: Vec<Ticket>,
    pub total_stake: u32,
    /// Percentage, only computed for the stable strategy
    pub expected_value: Option<f64>,
    pub rationale: Vec<String>,
    /// Upset race without any positive expected-value combination
    pub no_profitable_outcome: bool,
}

impl StrategyResult {
    fn new(tier: Tier, label: &str, tickets: Vec<Ticket>) -> Self {
        let total_stake = tickets.iter().map(|t| t.stake).sum();
        Self {
            tier,
            label: label.to_string(),
            tickets,
            total_stake,
            expected_value: None,
            rationale: Vec::new(),
            no_profitable_outcome: false,
        }
    }
}

pub struct TicketOptimizer;

impl TicketOptimizer {
    pub fn optimize(candidates: &TierCandidates, odds: &OddsTable, stability: u8) -> StrategyResult {
        if stability >= STABLE_THRESHOLD {
            Self::stable_strategy(&candidates.favorite, odds)
        } else if stability >= MIXED_THRESHOLD {
            Self::mixed_strategy(&candidates.balanced, odds)
        } else {
            Self::upset_strategy(&candidates.long_shot, odds)
        }
    }

    /// One main trifecta on the top favorite and a trio hedge on the same boats
    pub fn stable_strategy(favorites: &[Candidate], odds: &OddsTable) -> StrategyResult {
        let Some(top) = favorites.first() else {
            return StrategyResult::new(Tier::Favorite, "Stable race: no candidate", Vec::new());
        };

        let hit = hit_probability(top);
        let combination = top.key();
        let hedge_combination = trio_key(top.boats);
        let trifecta_odds = quoted_trifecta(odds, top);
        let trio_odds = odds.get_trio(top.boats).unwrap_or(0.0);

        let mut tickets = Vec::with_capacity(2);
        if trifecta_odds > 0.0 {
            tickets.push(Ticket {
                bet_type: BetType::Trifecta,
                combination: combination.clone(),
                stake: STABLE_MAIN_STAKE,
                odds: trifecta_odds,
                expected_return: Some(trifecta_odds * STABLE_MAIN_STAKE as f64 * hit),
                purpose: "main".to_string(),
            });
        }
        if trio_odds > 0.0 {
            tickets.push(Ticket {
                bet_type: BetType::Trio,
                combination: hedge_combination,
                stake: STABLE_HEDGE_STAKE,
                odds: trio_odds,
                expected_return: Some(trio_odds * STABLE_HEDGE_STAKE as f64 * hit * HEDGE_BOOST),
                purpose: "hedge".to_string(),
            });
        }

        let mut result = StrategyResult::new(
            Tier::Favorite,
            "Stable race: single favorite with trio hedge",
            tickets,
        );

        let total_return: f64 = result
            .tickets
            .iter()
            .filter_map(|t| t.expected_return)
            .sum();
        let ev = if result.total_stake > 0 {
            let stake = result.total_stake as f64;
            (total_return - stake) / stake * 100.0
        } else {
            0.0
        };

        result.expected_value = Some(ev);
        result.rationale = vec![
            format!("Trifecta {} at {:.1}x", combination, trifecta_odds),
            format!("Hit probability {:.1}%, expected value {:.1}%", hit * 100.0, ev),
            "Trio on the same boats hedges the order".to_string(),
        ];
        result
    }

    /// Top balanced trifectas plus exacta from the axis boat to every other course
    pub fn mixed_strategy(balanced: &[Candidate], odds: &OddsTable) -> StrategyResult {
        let mut tickets = Vec::new();

        for (i, candidate) in balanced.iter().take(MIXED_TRIFECTA_COUNT).enumerate() {
            let trifecta_odds = quoted_trifecta(odds, candidate);
            if trifecta_odds > 0.0 {
                tickets.push(Ticket {
                    bet_type: BetType::Trifecta,
                    combination: candidate.key(),
                    stake: MIXED_TRIFECTA_STAKE,
                    odds: trifecta_odds,
                    expected_return: Some(
                        trifecta_odds * MIXED_TRIFECTA_STAKE as f64 * candidate.score,
                    ),
                    purpose: format!("main {}", i + 1),
                });
            }
        }

        for second in (1..=6u8).filter(|&c| c != MIXED_AXIS) {
            let exacta_odds = odds.get_exacta(MIXED_AXIS, second).unwrap_or(0.0);
            if exacta_odds > 0.0 {
                tickets.push(Ticket {
                    bet_type: BetType::Exacta,
                    combination: exacta_key(MIXED_AXIS, second),
                    stake: MIXED_EXACTA_STAKE,
                    odds: exacta_odds,
                    expected_return: None,
                    purpose: "axis".to_string(),
                });
            }
        }

        let mut result = StrategyResult::new(
            Tier::Balanced,
            "Mixed race: balanced picks with course 1 axis",
            tickets,
        );
        result.rationale = vec![format!(
            "{} tickets, total stake {}",
            result.tickets.len(),
            result.total_stake
        )];
        result
    }

    /// Long shots with positive expected value, best first
    pub fn upset_strategy(long_shots: &[Candidate], odds: &OddsTable) -> StrategyResult {
        let stake = UPSET_STAKE as f64;

        let mut ranked: Vec<(String, f64, f64)> = long_shots
            .iter()
            .take(UPSET_POOL)
            .filter_map(|candidate| {
                let trifecta_odds = quoted_trifecta(odds, candidate);
                if trifecta_odds <= 0.0 {
                    return None;
                }
                let combination = candidate.key();
                let ev = hit_probability(candidate) * trifecta_odds * stake - stake;
                debug!("{} odds {:.1} ev {:.1}", combination, trifecta_odds, ev);
                Some((combination, trifecta_odds, ev))
            })
            .filter(|(_, _, ev)| *ev > 0.0)
            .collect();

        if ranked.is_empty() {
            let mut result = StrategyResult::new(
                Tier::LongShot,
                "Skip: no positive expected-value combination",
                Vec::new(),
            );
            result.no_profitable_outcome = true;
            result.rationale = vec!["No long shot pays enough for its probability".to_string()];
            return result;
        }

        ranked.sort_by(|a, b| b.2.total_cmp(&a.2));

        let tickets: Vec<Ticket> = ranked
            .into_iter()
            .take(UPSET_MAX_TICKETS)
            .map(|(combination, trifecta_odds, ev)| Ticket {
                bet_type: BetType::Trifecta,
                combination,
                stake: UPSET_STAKE,
                odds: trifecta_odds,
                expected_return: Some(ev + stake),
                purpose: "long shot".to_string(),
            })
            .collect();

        let mut result = StrategyResult::new(
            Tier::LongShot,
            "Upset race: top expected-value long shots",
            tickets,
        );
        result.total_stake = UPSET_TOTAL_STAKE;
        result.rationale = vec![format!(
            "{} positive expected-value combinations",
            result.tickets.len()
        )];
        result
    }
}
