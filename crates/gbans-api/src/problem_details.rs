//! [RFC 9457] problem details.
//!
//! [RFC 9457]: https://www.rfc-editor.org/rfc/rfc9457.html

use std::borrow::Cow;

use axum::response::{IntoResponse, Response};
use serde::ser::{Serialize, SerializeMap, Serializer};

const CONTENT_TYPE: &str = "application/problem+json";

macro_rules! uri {
    ($fragment:literal) => {
        concat!("https://github.com/leighmacdonald/gbans/wiki/problems#", $fragment)
    };
}

/// The kinds of problems the API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    MissingHeader,
    InvalidHeader,
    InvalidPathParameters,
    InvalidQueryString,
    InvalidRequestBody,
    InvalidFlags,
    InvalidImmunity,
    InvalidSteamId,
    InvalidIpAddress,
    EmptyField,
    SelfImmunity,
    AdminAlreadyExists,
    GroupNameTaken,
    OverrideAlreadyExists,
    ImmunityAlreadyExists,
    AlreadyInGroup,
    NotInGroup,
}

impl ProblemType {
    pub fn uri(self) -> &'static str {
        match self {
            Self::MissingHeader => uri!("missing-header"),
            Self::InvalidHeader => uri!("invalid-header"),
            Self::InvalidPathParameters => uri!("invalid-path-parameters"),
            Self::InvalidQueryString => uri!("invalid-query-string"),
            Self::InvalidRequestBody => uri!("invalid-request-body"),
            Self::InvalidFlags => uri!("invalid-flags"),
            Self::InvalidImmunity => uri!("invalid-immunity"),
            Self::InvalidSteamId => uri!("invalid-steam-id"),
            Self::InvalidIpAddress => uri!("invalid-ip-address"),
            Self::EmptyField => uri!("empty-field"),
            Self::SelfImmunity => uri!("self-immunity"),
            Self::AdminAlreadyExists => uri!("admin-already-exists"),
            Self::GroupNameTaken => uri!("group-name-taken"),
            Self::OverrideAlreadyExists => uri!("override-already-exists"),
            Self::ImmunityAlreadyExists => uri!("immunity-already-exists"),
            Self::AlreadyInGroup => uri!("already-in-group"),
            Self::NotInGroup => uri!("not-in-group"),
        }
    }

    pub fn status(self) -> http::StatusCode {
        match self {
            Self::MissingHeader
            | Self::InvalidHeader
            | Self::InvalidPathParameters
            | Self::InvalidQueryString
            | Self::InvalidFlags
            | Self::InvalidImmunity
            | Self::InvalidSteamId
            | Self::InvalidIpAddress
            | Self::EmptyField
            | Self::SelfImmunity => http::StatusCode::BAD_REQUEST,
            Self::AdminAlreadyExists
            | Self::GroupNameTaken
            | Self::OverrideAlreadyExists
            | Self::ImmunityAlreadyExists
            | Self::AlreadyInGroup
            | Self::NotInGroup => http::StatusCode::CONFLICT,
            Self::InvalidRequestBody => http::StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing required header",
            Self::InvalidHeader => "failed to parse header value",
            Self::InvalidPathParameters => "failed to parse path parameter(s)",
            Self::InvalidQueryString => "failed to parse query string",
            Self::InvalidRequestBody => "failed to parse request body",
            Self::InvalidFlags => "invalid admin flags",
            Self::InvalidImmunity => "immunity level must be between 0 and 100",
            Self::InvalidSteamId => "invalid SteamID",
            Self::InvalidIpAddress => "invalid IP address",
            Self::EmptyField => "required field is empty",
            Self::SelfImmunity => "a group cannot be immune to itself",
            Self::AdminAlreadyExists => "an admin with this identity already exists",
            Self::GroupNameTaken => "group name is already taken",
            Self::OverrideAlreadyExists => "override already exists",
            Self::ImmunityAlreadyExists => "group immunity already exists",
            Self::AlreadyInGroup => "admin is already a member of this group",
            Self::NotInGroup => "admin is not a member of this group",
        }
    }
}

/// An RFC 9457 response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemDetails {
    problem_type: ProblemType,
    detail: Option<Cow<'static, str>>,
    extension_members: serde_json::Map<String, serde_json::Value>,
}

impl ProblemDetails {
    pub fn new(problem_type: ProblemType) -> Self {
        Self { problem_type, detail: None, extension_members: serde_json::Map::new() }
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    /// Populates the ["detail"] member.
    ///
    /// ["detail"]: https://www.rfc-editor.org/rfc/rfc9457.html#section-3.1.4
    pub fn set_detail(&mut self, detail: impl Into<Cow<'static, str>>) {
        self.detail = Some(detail.into());
    }

    /// Adds an [extension member].
    ///
    /// Values that cannot be represented as JSON are skipped.
    ///
    /// [extension member]: https://www.rfc-editor.org/rfc/rfc9457.html#section-3.2
    pub fn add_extension<V>(&mut self, key: impl Into<String>, value: &V)
    where
        V: Serialize + ?Sized,
    {
        let key = key.into();

        match serde_json::to_value(value) {
            Ok(value) => {
                self.extension_members.insert(key, value);
            },
            Err(error) => warn!(%key, %error, "failed to serialize problem details extension"),
        }
    }
}

impl Serialize for ProblemDetails {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let field_count = 3 + usize::from(self.detail.is_some()) + self.extension_members.len();
        let mut serializer = serializer.serialize_map(Some(field_count))?;

        serializer.serialize_entry("type", self.problem_type.uri())?;
        serializer.serialize_entry("status", &self.problem_type.status().as_u16())?;
        serializer.serialize_entry("title", self.problem_type.title())?;

        if let Some(ref detail) = self.detail {
            serializer.serialize_entry("detail", detail)?;
        }

        for (key, value) in &self.extension_members {
            serializer.serialize_entry(key, value)?;
        }

        serializer.end()
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(error) => {
                error!(%error, "failed to serialize problem details");
                return http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
            },
        };

        (
            self.problem_type.status(),
            [(http::header::CONTENT_TYPE, http::HeaderValue::from_static(CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_members_in_order() {
        let mut details = ProblemDetails::new(ProblemType::AlreadyInGroup);
        details.set_detail("admin #1 is already in group #2");
        details.add_extension("group_id", &2);

        let json = serde_json::to_value(&details).unwrap();

        assert_eq!(json["status"], 409);
        assert_eq!(json["title"], "admin is already a member of this group");
        assert_eq!(json["detail"], "admin #1 is already in group #2");
        assert_eq!(json["group_id"], 2);
        assert!(json["type"].as_str().unwrap().ends_with("#already-in-group"));
    }
}
