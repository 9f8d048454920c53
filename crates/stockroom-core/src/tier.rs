//! # Tier Catalog
//!
//! Discount tiers ordered by spend threshold, and resolution of a spend
//! amount to the tier it earns.
//!
//! ## Resolution
//! ```text
//!   tiers (ascending):   0 ──────── 10 000 ──────── 50 000 ─────────►
//!                        Bronze 0%  Silver 5%       Gold 10%
//!
//!   spend  7 500  ──► Bronze
//!   spend 10 000  ──► Silver   (threshold is inclusive)
//!   spend 99 999  ──► Gold
//!
//!   no tier at or below spend ──► synthesized baseline (0, 0%)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Tier;
use crate::validation::{validate_discount_percent, validate_min_spend, validate_name};
use crate::BASELINE_TIER_ID;

/// In-memory tier ladder.
///
/// Thresholds are unique; the list is kept sorted ascending so that
/// resolution is a reverse scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    pub fn new() -> Self {
        TierCatalog { tiers: Vec::new() }
    }

    /// Builds a catalog from stored tiers, applying the same checks as
    /// [`TierCatalog::insert`].
    pub fn from_tiers(tiers: impl IntoIterator<Item = Tier>) -> CoreResult<Self> {
        let mut catalog = TierCatalog::new();
        for tier in tiers {
            catalog.insert(tier)?;
        }
        Ok(catalog)
    }

    /// The zero-threshold, zero-discount tier used when nothing qualifies.
    pub fn baseline() -> Tier {
        Tier {
            id: BASELINE_TIER_ID.to_string(),
            name: "Baseline".to_string(),
            min_spend_cents: 0,
            discount_percent: 0,
        }
    }

    /// Checks a tier definition against the catalog without adding it.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, negative threshold, or percent
    ///   outside 0..=100
    /// - `DuplicateTierThreshold` when the threshold is already taken
    pub fn check_candidate(
        &self,
        name: &str,
        min_spend_cents: i64,
        discount_percent: i64,
    ) -> CoreResult<()> {
        validate_name("name", name)?;
        validate_min_spend(min_spend_cents)?;
        validate_discount_percent(discount_percent)?;

        if self.threshold_taken(min_spend_cents) {
            return Err(CoreError::DuplicateTierThreshold { min_spend_cents });
        }
        Ok(())
    }

    /// Adds a tier, keeping the ladder sorted.
    pub fn insert(&mut self, tier: Tier) -> CoreResult<()> {
        self.check_candidate(&tier.name, tier.min_spend_cents, tier.discount_percent as i64)?;

        let at = self
            .tiers
            .partition_point(|t| t.min_spend_cents < tier.min_spend_cents);
        self.tiers.insert(at, tier);
        Ok(())
    }

    /// Highest-threshold tier whose threshold is at or below `spend`.
    pub fn resolve(&self, spend: Money) -> Tier {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.min_spend_cents <= spend.cents())
            .cloned()
            .unwrap_or_else(TierCatalog::baseline)
    }

    /// Shorthand for `resolve(spend).discount_percent`.
    pub fn discount_for(&self, spend: Money) -> u32 {
        self.resolve(spend).discount_percent
    }

    /// Tiers in ascending threshold order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    fn threshold_taken(&self, min_spend_cents: i64) -> bool {
        self.tiers
            .binary_search_by_key(&min_spend_cents, |t| t.min_spend_cents)
            .is_ok()
    }
}

/// The ladder seeded into an empty catalog: Bronze, Silver, Gold, Platinum.
///
/// Thresholds are 0, 100.00, 500.00 and 1000.00 with 0/5/10/15 percent off.
pub fn default_ladder() -> Vec<Tier> {
    [
        ("Bronze", 0, 0),
        ("Silver", 10_000, 5),
        ("Gold", 50_000, 10),
        ("Platinum", 100_000, 15),
    ]
    .into_iter()
    .map(|(name, min_spend_cents, discount_percent)| Tier {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        min_spend_cents,
        discount_percent,
    })
    .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
