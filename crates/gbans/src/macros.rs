//! Utility macros.
//!
//! This module is declared with `#[macro_use]`, so every macro defined in here is in-scope by
//! default in every other module of this crate.

/// Defines an "ID" type backed by an unsigned integer column.
///
/// # Example
///
/// ```ignore
/// define_id_type! {
///     /// Useful documentation.
///     pub struct MyId(u32);
/// }
/// ```
macro_rules! define_id_type {
    {
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($inner:ty);

        $($item:item)*
    } => {
        $(#[$meta])*
        #[derive(
            Debug,
            Display,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
            sqlx::Type,
        )]
        #[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        #[sqlx(transparent)]
        $vis struct $name($inner);

        impl $name {
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = <$inner as std::str::FromStr>::Err;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                <$inner as std::str::FromStr>::from_str(value).map($name)
            }
        }

        $($item)*
    };
}

/// Implements [`sqlx::Type`], [`sqlx::Encode`], and [`sqlx::Decode`] for a string-like enum that
/// already implements [`AsRef<str>`] and [`FromStr`].
///
/// [`FromStr`]: std::str::FromStr
macro_rules! impl_sqlx_via_str {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<u8>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                <&str as sqlx::Encode<'q, sqlx::MySql>>::encode(self.as_ref(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                <&str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)?
                    .parse::<Self>()
                    .map_err(Into::into)
            }
        }
    };
}
