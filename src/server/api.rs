use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::{RequestError, Result};
use super::state::AppState;
use super::types::*;
use crate::descriptor::DescriptorFamily;
use crate::distance::Metric;
use crate::engine::StoreInfo;
use crate::metrics;

/// 搜索一张图片
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "图片无法解码或参数错误"),
        (status = 404, description = "特征库尚未构建或为空"),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(data): TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let family = match &data.family {
        Some(s) => s
            .parse::<DescriptorFamily>()
            .map_err(|e| RequestError::InvalidParam("family", e))?,
        None => state.search.family,
    };
    let metric = match &data.metric {
        Some(s) => s.parse::<Metric>().map_err(|e| RequestError::InvalidParam("metric", e))?,
        None => state.search.metric,
    };
    let k = data.k.unwrap_or(state.search.count);

    info!("正在搜索上传图片: {} {} k={}", family, metric, k);

    let start = Instant::now();
    let result = state.db.search(&data.file, family, metric, k).await?;

    Ok(Json(SearchResponse {
        time: start.elapsed().as_millis() as u64,
        result,
    }))
}

/// 登记或更新一个身份的人脸
#[utoipa::path(
    post,
    path = "/enroll",
    request_body(content = EnrollForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "登记成功"),
        (status = 401, description = "token 错误"),
    ),
    security(("token" = []))
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    TypedMultipart(data): TypedMultipart<EnrollRequest>,
) -> Result<()> {
    if token != state.token {
        return Err(RequestError::Unauthorized.into());
    }
    if data.identity.trim().is_empty() {
        return Err(RequestError::InvalidParam("identity", "身份不能为空".to_string()).into());
    }
    state.db.enroll_face(&data.identity, &data.file).await?;
    Ok(())
}

/// 在已登记的人脸中识别身份，阈值由服务器的 `--threshold` 决定
#[utoipa::path(
    post,
    path = "/authenticate",
    request_body(content = AuthenticateForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = AuthenticateResponse),
    )
)]
pub async fn authenticate_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(data): TypedMultipart<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>> {
    let found = state.db.authenticate_face(&data.file, state.threshold).await?;
    Ok(Json(match found {
        Some(found) => AuthenticateResponse {
            identity: Some(found.identity),
            distance: Some(found.distance),
        },
        None => AuthenticateResponse {
            identity: None,
            distance: None,
        },
    }))
}

/// 查看所有特征库的状态
#[utoipa::path(
    get,
    path = "/stores",
    responses(
        (status = 200, body = Vec<StoreInfo>),
    )
)]
pub async fn stores_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StoreInfo>>> {
    Ok(Json(state.db.stores().await?))
}

/// prometheus 指标
#[utoipa::path(get, path = "/metrics", responses((status = 200, body = String)))]
pub async fn metrics_handler() -> Result<String> {
    Ok(metrics::gather_text()?)
}
