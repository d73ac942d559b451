use rusty_money::iso;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Postgres,
};
use thiserror::Error;

use std::{fmt, str::FromStr};

#[derive(Error, Debug)]
#[error("ParseCurrencyError: '{0}' is not an ISO-4217 currency code")]
pub struct ParseCurrencyError(pub String);

/// ISO-4217 currency backed by the `rusty_money` registry.
#[derive(Clone, Copy)]
pub struct Currency {
    iso: &'static iso::Currency,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        self.iso.iso_alpha_code
    }

    pub fn name(&self) -> &'static str {
        self.iso.name
    }

    /// Number of minor-unit digits.
    pub fn exponent(&self) -> u32 {
        self.iso.exponent
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Currency {}

impl std::hash::Hash for Currency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.code().cmp(other.code())
    }
}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        iso::find(&code)
            .map(|iso| Currency { iso })
            .ok_or_else(|| ParseCurrencyError(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

impl sqlx::Type<Postgres> for Currency {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, Postgres> for Currency {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <&str as sqlx::Encode<'_, Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for Currency {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let code = <&str as sqlx::Decode<'r, Postgres>>::decode(value)?;
        Ok(code.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_codes() {
        let cad: Currency = "cad".parse().unwrap();
        assert_eq!(cad.code(), "CAD");
        let irr: Currency = "IRR".parse().unwrap();
        assert_eq!(irr.to_string(), "IRR");
        assert_ne!(cad, irr);
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!("XYZW".parse::<Currency>().is_err());
    }

    #[test]
    fn serializes_as_code() {
        let usd: Currency = "USD".parse().unwrap();
        let json = serde_json::to_string(&usd).unwrap();
        assert_eq!(json, "\"USD\"");
        let back: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, usd);
    }
}
