use crate::core::{ErrorKind, RaceError};
use crate::tracker::BatchReport;
use serde::{Deserialize, Serialize};

/// Outcome classification carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Ok,
    ClientError,
    Conflict,
    NotFound,
    ServerError,
}

impl Status {
    pub fn http_code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ClientError => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::ServerError => 500,
        }
    }
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput | ErrorKind::ConstraintViolation => Self::ClientError,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Conflict => Self::Conflict,
            ErrorKind::StoreUnavailable => Self::ServerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// `{status, data?, error?}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &RaceError) -> Self {
        Self {
            status: err.kind().into(),
            data: None,
            error: Some(ApiError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    pub fn from_result(result: crate::core::Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }
}

impl<T: BatchReport> ApiResponse<T> {
    /// Any accepted item makes the batch `ok`. Otherwise store failures win
    /// over version conflicts, which win over client errors.
    pub fn from_batch(result: crate::core::Result<T>) -> Self {
        let report = match result {
            Ok(report) => report,
            Err(err) => return Self::failure(&err),
        };
        if report.accepted_count() > 0 {
            return Self::ok(report);
        }

        let kinds: Vec<ErrorKind> = report
            .rejection_reasons()
            .into_iter()
            .map(|reason| reason.kind())
            .collect();
        let (status, kind) = if kinds.contains(&ErrorKind::StoreUnavailable) {
            (Status::ServerError, ErrorKind::StoreUnavailable)
        } else if kinds.contains(&ErrorKind::Conflict) {
            (Status::Conflict, ErrorKind::Conflict)
        } else {
            let kind = kinds.first().copied().unwrap_or(ErrorKind::InvalidInput);
            (Status::ClientError, kind)
        };
        let message = if kinds.is_empty() {
            "Batch contained no items".to_string()
        } else {
            format!("No items were accepted ({} rejected)", kinds.len())
        };

        Self {
            status,
            data: Some(report),
            error: Some(ApiError { kind, message }),
        }
    }
}
