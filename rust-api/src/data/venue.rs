//! Venue (stadium) names and codes

use serde::{Deserialize, Serialize};
use std::fmt;

const VENUES: [&str; 24] = [
    "桐生",
    "戸田",
    "江戸川",
    "平和島",
    "多摩川",
    "浜名湖",
    "蒲郡",
    "常滑",
    "津",
    "三国",
    "びわこ",
    "住之江",
    "尼崎",
    "鳴門",
    "丸亀",
    "児島",
    "宮島",
    "徳山",
    "下関",
    "若松",
    "芦屋",
    "福岡",
    "唐津",
    "大村",
];

/// One of the 24 boat race venues, identified by its code 1-24
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Venue(u8);

impl Venue {
    pub fn from_code(code: u8) -> Option<Self> {
        (1..=24).contains(&code).then_some(Self(code))
    }

    /// Look up a venue by its Japanese name
    pub fn from_name(name: &str) -> Option<Self> {
        VENUES
            .iter()
            .position(|&v| v == name.trim())
            .map(|idx| Self(idx as u8 + 1))
    }

    /// Accept either a venue name or a numeric code ("24", "1")
    pub fn parse(input: &str) -> Option<Self> {
        Self::from_name(input).or_else(|| input.trim().parse::<u8>().ok().and_then(Self::from_code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Zero-padded code as used in file names and URLs ("01".."24")
    pub fn code_str(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn name(self) -> &'static str {
        VENUES[(self.0 - 1) as usize]
    }

    pub fn all() -> impl Iterator<Item = Venue> {
        (1..=24).map(Venue)
    }
}

impl TryFrom<u8> for Venue {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown venue code {}", code))
    }
}

impl From<Venue> for u8 {
    fn from(venue: Venue) -> Self {
        venue.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code_str())
    }
}
