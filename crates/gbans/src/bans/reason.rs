use std::fmt;

/// Why a ban was issued.
///
/// Stored as an integer; values this version does not know about decode as
/// [`BanReason::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BanReason {
    Unknown,
    Custom,
    External,
    Cheating,
    Racism,
    Harassment,
    Exploiting,
    WarningsExceeded,
    Spam,
    Language,
    Profile,
    ItemDescriptions,
    BotHost,
    Evading,
    Username,
}

impl BanReason {
    pub const fn from_repr(value: i64) -> Self {
        match value {
            1 => Self::Custom,
            2 => Self::External,
            3 => Self::Cheating,
            4 => Self::Racism,
            5 => Self::Harassment,
            6 => Self::Exploiting,
            7 => Self::WarningsExceeded,
            8 => Self::Spam,
            9 => Self::Language,
            10 => Self::Profile,
            11 => Self::ItemDescriptions,
            12 => Self::BotHost,
            13 => Self::Evading,
            14 => Self::Username,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Custom => "Custom",
            Self::External => "3rd party",
            Self::Cheating => "Cheating",
            Self::Racism => "Racism",
            Self::Harassment => "Personal Harassment",
            Self::Exploiting => "Exploiting",
            Self::WarningsExceeded => "Warnings Exceeded",
            Self::Spam => "Spam",
            Self::Language => "Language",
            Self::Profile => "Profile",
            Self::ItemDescriptions => "Item Name or Descriptions",
            Self::BotHost => "BotHost",
            Self::Evading => "Evading",
            Self::Username => "Inappropriate Username",
        }
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_and_unknown_values() {
        assert_eq!(BanReason::from_repr(3), BanReason::Cheating);
        assert_eq!(BanReason::from_repr(14), BanReason::Username);
        assert_eq!(BanReason::from_repr(0), BanReason::Unknown);
        assert_eq!(BanReason::from_repr(99), BanReason::Unknown);
    }

    #[test]
    fn human_readable_names() {
        assert_eq!(BanReason::External.to_string(), "3rd party");
        assert_eq!(BanReason::Harassment.to_string(), "Personal Harassment");
        assert_eq!(BanReason::ItemDescriptions.to_string(), "Item Name or Descriptions");
    }
}
