// The `{ data, code }` envelope every public operation returns

use serde::Serialize;
use serde_json::Value;

pub mod messages {
    pub const NOT_FOUND_SHORT: &str = "Not found.";
    pub const NOT_FOUND_LONG: &str = "Not found, please provide a valid id.";
    pub const INTERNAL_SERVER_ERROR_SHORT: &str = "Internal server error.";
    pub const INTERNAL_SERVER_ERROR_LONG: &str = "Internal server error, please try again later.";
    pub const BAD_REQUEST: &str = "Trip already saved";

    pub const TRIPS_FETCHED: &str = "Trips fetched successfully";
    pub const TRIP_FETCHED: &str = "Trip fetched successfully";
    pub const TRIP_ADDED: &str = "Trip added to saved list";
    pub const LIST_FETCHED: &str = "Saved list fetched successfully";
    pub const TRIP_REMOVED: &str = "Trip removed from saved list";
    pub const LIST_EXPORTED: &str = "Saved list exported successfully";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub data: ResponseBody,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessBody),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessBody {
    pub data: Value,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PaginationLinks>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub last: String,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

impl PaginationLinks {
    /// Builds the navigation links for `route`.
    ///
    /// `prev` is empty on the first page and `next` is empty from
    /// `total_pages` onwards.
    pub fn build(route: &str, page: usize, limit: usize, total_pages: usize) -> Self {
        let link = |n: usize| format!("{route}?page={n}&limit={limit}");
        Self {
            self_link: link(page),
            first: link(1),
            prev: (page > 1).then(|| link(page - 1)),
            next: page.checked_add(1).filter(|n| *n <= total_pages).map(link),
            last: link(total_pages),
            total_pages,
        }
    }
}

impl ApiResponse {
    pub fn success(code: u16, data: Value, message: &str) -> Self {
        Self::paged(code, data, message, None)
    }

    pub fn paged(code: u16, data: Value, message: &str, links: Option<PaginationLinks>) -> Self {
        Self {
            data: ResponseBody::Success(SuccessBody {
                data,
                message: message.to_string(),
                links,
            }),
            code,
        }
    }

    pub fn error(code: u16, error: &str, message: &str, detail: &str) -> Self {
        Self {
            data: ResponseBody::Error(ErrorBody {
                error: error.to_string(),
                message: message.to_string(),
                detail: detail.to_string(),
            }),
            code,
        }
    }

    pub fn internal_error(code: u16) -> Self {
        Self::error(
            code,
            "INTERNAL_ERROR",
            messages::INTERNAL_SERVER_ERROR_SHORT,
            messages::INTERNAL_SERVER_ERROR_LONG,
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self.data, ResponseBody::Success(_))
    }

    pub fn message(&self) -> &str {
        match &self.data {
            ResponseBody::Success(body) => &body.message,
            ResponseBody::Error(body) => &body.message,
        }
    }

    // Success payload, if any
    pub fn payload(&self) -> Option<&Value> {
        match &self.data {
            ResponseBody::Success(body) => Some(&body.data),
            ResponseBody::Error(_) => None,
        }
    }

    pub fn links(&self) -> Option<&PaginationLinks> {
        match &self.data {
            ResponseBody::Success(body) => body.links.as_ref(),
            ResponseBody::Error(_) => None,
        }
    }
}
