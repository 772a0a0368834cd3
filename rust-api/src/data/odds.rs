//! Odds tables for trifecta (3連単), trio (3連複) and exacta (2連単)
//!
//! Odds are keyed by combination string: "first-second-third" for trifecta,
//! ascending "a-b-c" for trio and "first-second" for exacta.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Odds maps for one race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OddsTable {
    #[serde(alias = "sanrentan")]
    pub trifecta: BTreeMap<String, f64>,
    #[serde(alias = "sanrenpuku")]
    pub trio: BTreeMap<String, f64>,
    #[serde(alias = "niretan")]
    pub exacta: BTreeMap<String, f64>,
}

impl OddsTable {
    pub fn is_empty(&self) -> bool {
        self.trifecta.is_empty() && self.trio.is_empty() && self.exacta.is_empty()
    }

    /// Get trifecta odds for an ordered combination
    pub fn get_trifecta(&self, first: u8, second: u8, third: u8) -> Option<f64> {
        self.trifecta
            .get(&trifecta_key(first, second, third))
            .copied()
    }

    /// Get trio odds for a set of boats, order independent
    pub fn get_trio(&self, boats: [u8; 3]) -> Option<f64> {
        self.trio.get(&trio_key(boats)).copied()
    }

    /// Get exacta odds for an ordered pair
    pub fn get_exacta(&self, first: u8, second: u8) -> Option<f64> {
        self.exacta.get(&exacta_key(first, second)).copied()
    }

    /// Mean trifecta odds over the combinations that include `boat`
    pub fn average_trifecta_involving(&self, boat: u8) -> Option<f64> {
        let relevant: Vec<f64> = self
            .trifecta
            .iter()
            .filter_map(|(key, &odds)| {
                let (a, b, c) = parse_trifecta_key(key)?;
                (a == boat || b == boat || c == boat).then_some(odds)
            })
            .collect();

        if relevant.is_empty() {
            None
        } else {
            Some(relevant.iter().sum::<f64>() / relevant.len() as f64)
        }
    }
}

/// Build trifecta key "1-2-3"
pub fn trifecta_key(first: u8, second: u8, third: u8) -> String {
    format!("{}-{}-{}", first, second, third)
}

/// Build trio key with boats sorted ascending
pub fn trio_key(mut boats: [u8; 3]) -> String {
    boats.sort_unstable();
    format!("{}-{}-{}", boats[0], boats[1], boats[2])
}

/// Build exacta key "1-2"
pub fn exacta_key(first: u8, second: u8) -> String {
    format!("{}-{}", first, second)
}

/// Parse trifecta key "1-2-3" to (1, 2, 3)
pub fn parse_trifecta_key(key: &str) -> Option<(u8, u8, u8)> {
    let parts: Vec<&str> = key.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let first: u8 = parts[0].parse().ok()?;
    let second: u8 = parts[1].parse().ok()?;
    let third: u8 = parts[2].parse().ok()?;
    Some((first, second, third))
}
