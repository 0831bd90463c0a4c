use std::panic::Location;

use axum::response::{IntoResponse, Response};
use gbans::sourcemod::admins::InvalidAdmin;
use gbans::sourcemod::groups::InvalidGroup;
use gbans::sourcemod::overrides::InvalidOverride;
use headers::Header;

use crate::problem_details::{ProblemDetails, ProblemType};

/// The standard error response returned by handlers.
#[derive(Debug)]
pub struct ErrorResponse(ErrorKind);

#[derive(Debug)]
enum ErrorKind {
    Unauthorized,
    NotFound,
    FailedToBufferBody,
    InternalServerError,

    #[debug("{:?}", _0.problem_type())]
    Detailed(ProblemDetails),
}

impl ErrorResponse {
    fn detailed(problem_type: ProblemType, modify: impl FnOnce(&mut ProblemDetails)) -> Self {
        let mut details = ProblemDetails::new(problem_type);
        modify(&mut details);
        Self(ErrorKind::Detailed(details))
    }

    fn with_detail(problem_type: ProblemType, detail: impl ToString) -> Self {
        Self::detailed(problem_type, |details| details.set_detail(detail.to_string()))
    }

    pub(crate) fn unauthorized() -> Self {
        Self(ErrorKind::Unauthorized)
    }

    pub(crate) fn not_found() -> Self {
        Self(ErrorKind::NotFound)
    }

    pub(crate) fn failed_to_buffer_body() -> Self {
        Self(ErrorKind::FailedToBufferBody)
    }

    #[track_caller]
    pub(crate) fn internal_server_error<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        error!(
            error = &error as &dyn std::error::Error,
            loc = %Location::caller(),
            "internal server error",
        );

        Self(ErrorKind::InternalServerError)
    }

    pub(crate) fn missing_header<H: Header>() -> Self {
        Self::detailed(ProblemType::MissingHeader, |details| {
            details.add_extension("header", H::name().as_str());
        })
    }

    pub(crate) fn invalid_header<H: Header>(detail: impl ToString) -> Self {
        Self::detailed(ProblemType::InvalidHeader, |details| {
            details.add_extension("header", H::name().as_str());
            details.set_detail(detail.to_string());
        })
    }

    pub(crate) fn invalid_path_params(detail: impl ToString) -> Self {
        Self::with_detail(ProblemType::InvalidPathParameters, detail)
    }

    pub(crate) fn invalid_query_string(detail: impl ToString) -> Self {
        Self::with_detail(ProblemType::InvalidQueryString, detail)
    }

    pub(crate) fn invalid_request_body(modify: impl FnOnce(&mut ProblemDetails)) -> Self {
        Self::detailed(ProblemType::InvalidRequestBody, modify)
    }

    pub(crate) fn invalid_admin(error: InvalidAdmin) -> Self {
        let problem_type = match error {
            InvalidAdmin::InvalidSteamId(_) | InvalidAdmin::UnknownSteamAccount => {
                ProblemType::InvalidSteamId
            },
            InvalidAdmin::InvalidIp => ProblemType::InvalidIpAddress,
            InvalidAdmin::EmptyName | InvalidAdmin::MissingPassword => ProblemType::EmptyField,
            InvalidAdmin::Immunity(_) => ProblemType::InvalidImmunity,
            InvalidAdmin::Flag(_) => ProblemType::InvalidFlags,
        };

        Self::with_detail(problem_type, error)
    }

    pub(crate) fn invalid_group(error: InvalidGroup) -> Self {
        let problem_type = match error {
            InvalidGroup::EmptyName => ProblemType::EmptyField,
            InvalidGroup::Immunity(_) => ProblemType::InvalidImmunity,
            InvalidGroup::Flag(_) => ProblemType::InvalidFlags,
        };

        Self::with_detail(problem_type, error)
    }

    pub(crate) fn invalid_override(error: InvalidOverride) -> Self {
        let problem_type = match error {
            InvalidOverride::EmptyName | InvalidOverride::EmptyFlags => ProblemType::EmptyField,
            InvalidOverride::Flag(_) => ProblemType::InvalidFlags,
        };

        Self::with_detail(problem_type, error)
    }

    pub(crate) fn self_immunity() -> Self {
        Self::detailed(ProblemType::SelfImmunity, |_| {})
    }

    pub(crate) fn admin_already_exists() -> Self {
        Self::detailed(ProblemType::AdminAlreadyExists, |_| {})
    }

    pub(crate) fn group_name_taken() -> Self {
        Self::detailed(ProblemType::GroupNameTaken, |_| {})
    }

    pub(crate) fn override_already_exists() -> Self {
        Self::detailed(ProblemType::OverrideAlreadyExists, |_| {})
    }

    pub(crate) fn immunity_already_exists() -> Self {
        Self::detailed(ProblemType::ImmunityAlreadyExists, |_| {})
    }

    pub(crate) fn already_in_group() -> Self {
        Self::detailed(ProblemType::AlreadyInGroup, |_| {})
    }

    pub(crate) fn not_in_group() -> Self {
        Self::detailed(ProblemType::NotInGroup, |_| {})
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            ErrorKind::Unauthorized => http::StatusCode::UNAUTHORIZED.into_response(),
            ErrorKind::NotFound => http::StatusCode::NOT_FOUND.into_response(),
            ErrorKind::FailedToBufferBody => http::StatusCode::PAYLOAD_TOO_LARGE.into_response(),
            ErrorKind::InternalServerError => {
                http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
            },
            ErrorKind::Detailed(details) => details.into_response(),
        }
    }
}
