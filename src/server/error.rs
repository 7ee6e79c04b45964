use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::SearchError;

/// 请求参数错误
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("参数 {0} 无效: {1}")]
    InvalidParam(&'static str, String),

    #[error("鉴权失败")]
    Unauthorized,
}

/// API错误类型
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<RequestError>() {
            return match err {
                RequestError::InvalidParam(..) => StatusCode::BAD_REQUEST,
                RequestError::Unauthorized => StatusCode::UNAUTHORIZED,
            };
        }
        match self.0.downcast_ref::<SearchError>() {
            Some(SearchError::StoreNotFound(_) | SearchError::EmptyStore(_)) => {
                StatusCode::NOT_FOUND
            }
            Some(SearchError::DimensionMismatch(_) | SearchError::Extraction(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("请求处理失败: {:?}", self.0);
        }
        (status, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
