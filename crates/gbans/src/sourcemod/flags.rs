//! Admin flags and immunity levels.
//!
//! Both are shared by admins and groups; a group's flags and immunity are inherited by every admin
//! that is a member of it.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Every flag letter SourceMod understands.
///
/// `z` (root) comes first, followed by `a` (reservation) through `t` (custom6).
pub const VALID_FLAGS: &str = "zabcdefghijklmnopqrst";

/// A set of admin flags, e.g. `"bcdef"`.
///
/// Characters are kept in the order they were given in.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, serde::Serialize, sqlx::Type)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "utoipa", schema(value_type = String, example = "bcdef"))]
#[debug("{_0:?}")]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Flags(String);

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("invalid admin flag `{flag}`")]
pub struct InvalidFlag {
    #[error(ignore)]
    pub flag: char,
}

/// An immunity level in `0..=100`.
#[derive(
    Debug,
    Display,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    sqlx::Type,
)]
#[debug("{_0}")]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Immunity(u8);

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("invalid immunity level {value}, must be between 0-100")]
pub struct InvalidImmunity {
    #[error(ignore)]
    pub value: i64,
}

impl Flags {
    pub fn new(flags: impl Into<String>) -> Result<Self, InvalidFlag> {
        let flags = flags.into();

        match flags.chars().find(|&flag| !VALID_FLAGS.contains(flag)) {
            None => Ok(Self(flags)),
            Some(flag) => Err(InvalidFlag { flag }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(flag)
    }

    /// Returns the flags in `self` followed by every flag of `other` not already present.
    pub fn union(&self, other: &Flags) -> Flags {
        let mut union = self.0.clone();

        for flag in other.0.chars() {
            if !union.contains(flag) {
                union.push(flag);
            }
        }

        Self(union)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl AsRef<str> for Flags {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Flags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)
            .and_then(|flags| Self::new(flags).map_err(serde::de::Error::custom))
    }
}

impl Immunity {
    pub const MAX: Self = Self(100);

    pub fn new(value: i64) -> Result<Self, InvalidImmunity> {
        u8::try_from(value)
            .ok()
            .filter(|&value| value <= Self::MAX.0)
            .map(Self)
            .ok_or(InvalidImmunity { value })
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Immunity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer)
            .and_then(|value| Self::new(value).map_err(serde::de::Error::custom))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::PartialSchema for Immunity {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        let object = utoipa::openapi::schema::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::Integer)
            .minimum(Some(0))
            .maximum(Some(Self::MAX.0))
            .build();

        utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::ToSchema for Immunity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_valid_flag() {
        assert!(Flags::new(VALID_FLAGS).is_ok());
        assert!(Flags::new("").is_ok());
        assert!(Flags::new("z").is_ok());
    }

    #[test]
    fn rejects_unknown_flags() {
        assert_eq!(Flags::new("abcx").unwrap_err(), InvalidFlag { flag: 'x' });
        assert_eq!(Flags::new("A").unwrap_err(), InvalidFlag { flag: 'A' });
        assert_eq!(Flags::new("u").unwrap_err(), InvalidFlag { flag: 'u' });
    }

    #[test]
    fn union_keeps_order_and_deduplicates() {
        let own = Flags::new("bcd").unwrap();
        let group = Flags::new("dze").unwrap();

        assert_eq!(own.union(&group).as_str(), "bcdze");
    }

    #[test]
    fn immunity_bounds() {
        assert_eq!(Immunity::new(0).unwrap().get(), 0);
        assert_eq!(Immunity::new(100).unwrap(), Immunity::MAX);
        assert!(Immunity::new(101).is_err());
        assert!(Immunity::new(-1).is_err());
    }

    #[cfg(feature = "utoipa")]
    #[test]
    fn immunity_schema_is_bounded() {
        use utoipa::PartialSchema;

        let schema = serde_json::to_value(Immunity::schema()).unwrap();

        assert_eq!(schema["type"], "integer");
        assert_eq!(schema["minimum"], 0);
        assert_eq!(schema["maximum"], 100);
    }
}
