use serde::{Deserialize, Serialize};

// ============================================================================
// Cancels Value Objects
// ============================================================================

/// Tri-state cancellation flag carried by every order record.
///
/// On the wire this is a nullable boolean (`null | true | false`). `Unset` is
/// kept distinct everywhere; only `or_not_cancelled` collapses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum CancellationFlag {
    #[default]
    Unset,
    Cancelled,
    NotCancelled,
}

impl CancellationFlag {
    pub fn is_set(&self) -> bool {
        !matches!(self, CancellationFlag::Unset)
    }

    /// Definite boolean view where an absent flag means "not cancelled".
    pub fn or_not_cancelled(&self) -> bool {
        matches!(self, CancellationFlag::Cancelled)
    }
}

impl From<Option<bool>> for CancellationFlag {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => CancellationFlag::Unset,
            Some(true) => CancellationFlag::Cancelled,
            Some(false) => CancellationFlag::NotCancelled,
        }
    }
}

impl From<CancellationFlag> for Option<bool> {
    fn from(flag: CancellationFlag) -> Self {
        match flag {
            CancellationFlag::Unset => None,
            CancellationFlag::Cancelled => Some(true),
            CancellationFlag::NotCancelled => Some(false),
        }
    }
}

/// Granularity a request asks to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accepter {
    Header,
    Item,
    #[serde(alias = "Schedule")]
    ItemScheduleLine,
    #[serde(other)]
    Unknown,
}

impl Accepter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accepter::Header => "Header",
            Accepter::Item => "Item",
            Accepter::ItemScheduleLine => "ItemScheduleLine",
            Accepter::Unknown => "Unknown",
        }
    }
}

/// Which way a schedule line's confirmed quantity moves against stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// Give the held quantity back (line is being cancelled)
    Release,
    /// Hold the quantity again (line is being placed or un-cancelled)
    Reserve,
}

impl StockDirection {
    pub fn for_cancellation(cancelled: bool) -> Self {
        if cancelled {
            StockDirection::Release
        } else {
            StockDirection::Reserve
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockDirection::Release => "release",
            StockDirection::Reserve => "reserve",
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
