//! Core types used throughout DealScout

use crate::error::{DealScoutError, Result};
use blake2::{Blake2b512, Digest};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Marketplace listing identifier, assigned by the listing source
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for negotiations (timestamp + random suffix)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NegotiationId(pub String);

impl NegotiationId {
    /// Generate a new unique negotiation ID
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self(format!("neg_{}_{:08x}", timestamp, rand::random::<u32>()))
    }
}

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blake2b 256-bit digest of a mutating request, used to recognize replays
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestFingerprint(pub [u8; 32]);

impl RequestFingerprint {
    /// Fingerprint arbitrary request bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result[..32]);
        RequestFingerprint(digest)
    }

    /// Get fingerprint as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A marketplace listing as supplied by the listing source.
///
/// Prices are whole currency units. Treated as read-only once scored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub asking_price: u64,
    pub condition: Option<String>,
    pub description: Option<String>,
    /// Days since the listing was posted, when the source knows it
    pub listing_age_days: Option<u32>,
}

impl Listing {
    /// Create a listing, rejecting a zero asking price
    pub fn new(id: impl Into<String>, title: impl Into<String>, asking_price: u64) -> Result<Self> {
        if asking_price == 0 {
            return Err(DealScoutError::Validation(
                "asking price must be positive".to_string(),
            ));
        }

        Ok(Self {
            id: ListingId(id.into()),
            title: title.into(),
            asking_price,
            condition: None,
            description: None,
            listing_age_days: None,
        })
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_age_days(mut self, days: u32) -> Self {
        self.listing_age_days = Some(days);
        self
    }
}

/// Round half away from zero to whole currency units, saturating at zero
/// and at `u64::MAX`.
pub fn round_amount(value: Decimal) -> u64 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX)
}
