use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::Serialize;
use utoipa::ToSchema;

use crate::ranker::QueryHit;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
    pub family: Option<String>,
    pub metric: Option<String>,
    pub k: Option<usize>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 描述符：glcm, haralick, bit, concat
    pub family: Option<String>,
    /// 距离度量：manhattan, euclidean, chebyshev, canberra
    pub metric: Option<String>,
    /// 返回的结果数量
    pub k: Option<usize>,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 按距离升序排列的结果
    pub result: Vec<QueryHit>,
}

/// 登记人脸的参数
#[derive(TryFromMultipart)]
pub struct EnrollRequest {
    pub identity: String,
    pub file: Bytes,
}

/// 登记人脸表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct EnrollForm {
    /// 身份
    pub identity: String,
    /// 人脸图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// 人脸识别的参数
#[derive(TryFromMultipart)]
pub struct AuthenticateRequest {
    pub file: Bytes,
}

/// 人脸识别表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AuthenticateForm {
    /// 人脸图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// 人脸识别响应，没有匹配时 `identity` 为空
#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct AuthenticateResponse {
    pub identity: Option<String>,
    pub distance: Option<f64>,
}
