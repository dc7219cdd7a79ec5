use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::item::Item;

/// Stock filter offered by the read view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    #[default]
    All,
    Available,
    SoldOut,
}

impl StockFilter {
    pub const VARIANTS: [Self; 3] = [Self::All, Self::Available, Self::SoldOut];

    /// Parse a `filter` query value; anything unrecognised means `All`
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Available => "available",
            Self::SoldOut => "sold_out",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Available => "Available",
            Self::SoldOut => "Sold Out",
        }
    }

    pub const fn matches(self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Available => !item.is_sold_out,
            Self::SoldOut => item.is_sold_out,
        }
    }

    pub fn apply(self, items: Vec<Item>) -> Vec<Item> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

impl fmt::Display for StockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "available" => Ok(Self::Available),
            "sold_out" => Ok(Self::SoldOut),
            other => Err(format!("unknown stock filter '{other}'")),
        }
    }
}
