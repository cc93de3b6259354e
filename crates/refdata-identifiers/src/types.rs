//! Identifier domain enums.
//!
//! [`IdentifierType`] is the security identifier set used by the equity and
//! bond services. Managers are generic over [`IdentifierKind`] so another
//! asset class can bring its own enum.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Numeric key of the entity (equity, bond, ...) owning identifiers.
pub type EntityId = u64;

/// An enum of identifier types that the managers can version.
///
/// Implementors serialize as their tag string, so snapshot maps keyed by
/// the kind render as `{"ISIN": {...}}` in JSON.
pub trait IdentifierKind:
    Copy + Eq + Ord + Hash + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Canonical upper-case tag (`"ISIN"`, `"TICKER"`, ...).
    fn as_str(&self) -> &'static str;

    /// Every member, in declaration order.
    fn all() -> &'static [Self];

    /// Looks a member up by its tag.
    fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.as_str() == tag)
    }
}

/// Security identifier types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentifierType {
    // Primary market identifiers
    /// Trading symbol.
    Ticker,
    /// International Securities Identification Number.
    Isin,
    /// CUSIP.
    Cusip,
    /// Stock Exchange Daily Official List.
    Sedol,
    /// Wertpapierkennnummer.
    Wkn,
    /// Swiss Valor number.
    Valor,

    // Global identifiers
    /// Financial Instrument Global Identifier.
    Figi,
    /// Legal Entity Identifier.
    Lei,
    /// Global Intermediary Identification Number.
    Giin,

    // Data providers
    /// Bloomberg ticker.
    BloombergTicker,
    /// Bloomberg FIGI.
    BloombergFigi,
    /// Bloomberg global id.
    BloombergGlobalId,
    /// Reuters Instrument Code.
    ReutersRic,
    /// Refinitiv permanent identifier.
    RefinitivPermid,
    /// FactSet entity id.
    FactsetEntityId,
    /// Morningstar id.
    MorningstarId,

    // Exchange specific
    /// Local exchange code.
    LocalCode,
    /// Market Identifier Code.
    Mic,
    /// Exchange symbol.
    ExchangeSymbol,

    // Regional
    /// CUSIP International Numbering System.
    Cins,
    /// Euroclear/Clearstream common code.
    CommonCode,
    /// French SICOVAM code.
    Sicovam,

    // Classification and filings
    /// SEC Central Index Key.
    Cik,
    /// Global Industry Classification Standard.
    Gics,
    /// Standard Industrial Classification.
    Sic,
    /// North American Industry Classification System.
    Naics,

    // Internal
    /// Internal id.
    InternalId,
    /// Free-form custom identifier.
    Custom,
}

impl IdentifierType {
    const ALL: [IdentifierType; 28] = [
        Self::Ticker,
        Self::Isin,
        Self::Cusip,
        Self::Sedol,
        Self::Wkn,
        Self::Valor,
        Self::Figi,
        Self::Lei,
        Self::Giin,
        Self::BloombergTicker,
        Self::BloombergFigi,
        Self::BloombergGlobalId,
        Self::ReutersRic,
        Self::RefinitivPermid,
        Self::FactsetEntityId,
        Self::MorningstarId,
        Self::LocalCode,
        Self::Mic,
        Self::ExchangeSymbol,
        Self::Cins,
        Self::CommonCode,
        Self::Sicovam,
        Self::Cik,
        Self::Gics,
        Self::Sic,
        Self::Naics,
        Self::InternalId,
        Self::Custom,
    ];
}

impl IdentifierKind for IdentifierType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ticker => "TICKER",
            Self::Isin => "ISIN",
            Self::Cusip => "CUSIP",
            Self::Sedol => "SEDOL",
            Self::Wkn => "WKN",
            Self::Valor => "VALOR",
            Self::Figi => "FIGI",
            Self::Lei => "LEI",
            Self::Giin => "GIIN",
            Self::BloombergTicker => "BLOOMBERG_TICKER",
            Self::BloombergFigi => "BLOOMBERG_FIGI",
            Self::BloombergGlobalId => "BLOOMBERG_GLOBAL_ID",
            Self::ReutersRic => "REUTERS_RIC",
            Self::RefinitivPermid => "REFINITIV_PERMID",
            Self::FactsetEntityId => "FACTSET_ENTITY_ID",
            Self::MorningstarId => "MORNINGSTAR_ID",
            Self::LocalCode => "LOCAL_CODE",
            Self::Mic => "MIC",
            Self::ExchangeSymbol => "EXCHANGE_SYMBOL",
            Self::Cins => "CINS",
            Self::CommonCode => "COMMON_CODE",
            Self::Sicovam => "SICOVAM",
            Self::Cik => "CIK",
            Self::Gics => "GICS",
            Self::Sic => "SIC",
            Self::Naics => "NAICS",
            Self::InternalId => "INTERNAL_ID",
            Self::Custom => "CUSTOM",
        }
    }

    fn all() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierType {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(&s.trim().to_uppercase())
            .ok_or_else(|| IdentifierError::unsupported_type(s))
    }
}

/// Why an identifier changed.
///
/// Services can record their own reasons through [`ChangeReason::Other`];
/// they round-trip through serde as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeReason {
    /// Merger, spin-off, rename and similar events.
    CorporateAction,
    /// Fix of a wrong value.
    DataCorrection,
    /// First value for the identifier type.
    InitialAssignment,
    /// Bulk load from another system.
    SystemMigration,
    /// Service-specific reason.
    Other(String),
}

impl ChangeReason {
    /// Upper-case tag of this reason.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CorporateAction => "CORPORATE_ACTION",
            Self::DataCorrection => "DATA_CORRECTION",
            Self::InitialAssignment => "INITIAL_ASSIGNMENT",
            Self::SystemMigration => "SYSTEM_MIGRATION",
            Self::Other(reason) => reason,
        }
    }
}

impl From<String> for ChangeReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CORPORATE_ACTION" => Self::CorporateAction,
            "DATA_CORRECTION" => Self::DataCorrection,
            "INITIAL_ASSIGNMENT" => Self::InitialAssignment,
            "SYSTEM_MIGRATION" => Self::SystemMigration,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ChangeReason {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ChangeReason> for String {
    fn from(reason: ChangeReason) -> Self {
        match reason {
            ChangeReason::Other(reason) => reason,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentifierStatus {
    /// In force.
    Active,
    /// Withdrawn without replacement.
    Inactive,
    /// Waiting for approval.
    PendingApproval,
    /// Replaced by a later version.
    Superseded,
    /// Failed validation downstream.
    Error,
}

impl fmt::Display for IdentifierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Superseded => "SUPERSEDED",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// State of a change request. `Applied` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Awaiting review.
    Pending,
    /// Approved and written to history.
    Applied,
    /// Declined.
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Applied => "APPLIED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Coarse risk of a proposed identifier change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No review needed.
    Low,
    /// High-visibility identifier.
    Medium,
    /// Value fails format validation.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        };
        f.write_str(s)
    }
}
