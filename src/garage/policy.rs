// Upstream error → local HTTP status mapping.
//
// Each route picks one policy. Rules are tried in order; code matchers only
// apply to errors reported by the admin API, message matchers apply to the
// message of any upstream or transport failure.

use axum::http::StatusCode;

use super::error::GarageError;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    Code(&'static str),
    MessageContains(&'static str),
}

impl Matcher {
    fn matches(&self, error: &GarageError, message: &str) -> bool {
        match self {
            Matcher::Code(code) => error.code() == Some(*code),
            Matcher::MessageContains(needle) => message.contains(needle),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorRule {
    pub matcher: Matcher,
    pub status: StatusCode,
    /// Replaces the upstream message when set
    pub message: Option<&'static str>,
}

const fn rule(matcher: Matcher, status: StatusCode, message: Option<&'static str>) -> ErrorRule {
    ErrorRule { matcher, status, message }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    pub rules: &'static [ErrorRule],
    pub fallback_status: StatusCode,
    pub fallback_message: &'static str,
}

pub const BUCKET_CREATE: ErrorPolicy = ErrorPolicy {
    rules: &[rule(Matcher::Code("AccessDenied"), StatusCode::FORBIDDEN, None)],
    fallback_status: StatusCode::BAD_REQUEST,
    fallback_message: "Failed to create bucket",
};

pub const BUCKET_DELETE: ErrorPolicy = ErrorPolicy {
    rules: &[
        rule(
            Matcher::MessageContains("not empty"),
            StatusCode::BAD_REQUEST,
            Some("Bucket is not empty"),
        ),
        rule(
            Matcher::Code("NoSuchBucket"),
            StatusCode::NOT_FOUND,
            Some("Bucket not found"),
        ),
        rule(
            Matcher::Code("MethodNotAllowed"),
            StatusCode::METHOD_NOT_ALLOWED,
            Some("Invalid request method - contact administrator"),
        ),
        rule(
            Matcher::MessageContains("Method Not Allowed"),
            StatusCode::METHOD_NOT_ALLOWED,
            Some("Invalid request method - contact administrator"),
        ),
    ],
    fallback_status: StatusCode::INTERNAL_SERVER_ERROR,
    fallback_message: "Failed to delete bucket",
};

pub const BUCKET_ALLOW: ErrorPolicy = ErrorPolicy {
    rules: &[rule(
        Matcher::MessageContains("not found"),
        StatusCode::NOT_FOUND,
        Some("Bucket not found"),
    )],
    fallback_status: StatusCode::INTERNAL_SERVER_ERROR,
    fallback_message: "Internal server error",
};

pub const KEY_CREATE: ErrorPolicy = ErrorPolicy {
    rules: &[rule(Matcher::Code("AccessDenied"), StatusCode::FORBIDDEN, None)],
    fallback_status: StatusCode::BAD_REQUEST,
    fallback_message: "Failed to create key",
};

pub const NODE_FETCH: ErrorPolicy = ErrorPolicy {
    rules: &[],
    fallback_status: StatusCode::INTERNAL_SERVER_ERROR,
    fallback_message: "Failed to fetch nodes",
};

pub const NODE_ADD: ErrorPolicy = ErrorPolicy {
    rules: &[],
    fallback_status: StatusCode::INTERNAL_SERVER_ERROR,
    fallback_message: "Failed to add node",
};

pub const DEFAULT: ErrorPolicy = ErrorPolicy {
    rules: &[
        rule(Matcher::Code("AccessDenied"), StatusCode::FORBIDDEN, None),
        rule(
            Matcher::Code("NoSuchBucket"),
            StatusCode::NOT_FOUND,
            Some("Bucket not found"),
        ),
        rule(
            Matcher::Code("NoSuchAccessKey"),
            StatusCode::NOT_FOUND,
            Some("Key not found"),
        ),
    ],
    fallback_status: StatusCode::INTERNAL_SERVER_ERROR,
    fallback_message: "Upstream request failed",
};

impl ErrorPolicy {
    /// Translate a gateway failure into the error returned to the browser
    pub fn map(&self, error: &GarageError) -> ApiError {
        if let GarageError::MissingCredential = error {
            tracing::error!("{}", error);
            return ApiError::internal_server_error("Internal server error");
        }

        let message = error.message();
        if let Some(rule) = self.rules.iter().find(|r| r.matcher.matches(error, &message)) {
            let text = rule.message.map(str::to_string).unwrap_or_else(|| {
                if message.is_empty() { self.fallback_message.to_string() } else { message.clone() }
            });
            return ApiError::from_status(rule.status, text);
        }

        let text = if message.is_empty() {
            self.fallback_message.to_string()
        } else {
            message
        };
        ApiError::from_status(self.fallback_status, text)
    }
}
