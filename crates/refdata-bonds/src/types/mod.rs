//! Domain enums for bond records.
//!
//! Each enum serializes with the SCREAMING_SNAKE_CASE tag used by the
//! reference data services and parses the same tags through `FromStr`.

/// Declares a tag-backed domain enum with `as_str`, `all`, `Display` and `FromStr`.
macro_rules! domain_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident, unknown = $unknown:expr, {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the wire tag.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )+
                }
            }

            /// Returns every member in declaration order.
            #[must_use]
            pub fn all() -> &'static [$name] {
                &[ $( Self::$variant, )+ ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::BondError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let tag = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                match tag.as_str() {
                    $( $tag => Ok(Self::$variant), )+
                    _ => Err(($unknown)(s)),
                }
            }
        }
    };
}

mod bond_type;
mod conventions;

pub use bond_type::{BondType, SinkingFundType};
pub use conventions::{
    BusinessDayConventionKind, CalendarKind, CompoundingKind, CouponFrequency,
    DayCountConventionKind, FrequencyKind,
};
