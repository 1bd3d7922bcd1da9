use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// 요청 전 입력 검증 실패 (네트워크 접근 전에 반환)
    #[error("page_size must be a positive integer, got {0}")]
    InvalidPageSize(usize),

    /// API 응답 본문에 포함된 오류 코드 (예: INFO-200, ERROR-500)
    #[error("remote service error {code}: {message}")]
    Remote { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML read error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing field in response: {0}")]
    MissingField(&'static str),

    #[error("invalid number in response: {0}")]
    InvalidNumber(#[from] std::num::ParseFloatError),

    #[error("latitude {0} is outside the UTM latitude bands (-80..84)")]
    LatitudeOutOfRange(f64),

    #[error("geocoder returned no match for address: {0}")]
    AddressNotFound(String),
}
