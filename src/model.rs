use std::collections::BTreeMap;

/// 평면화된 한 행. 컬럼명 -> 문자열 값.
pub type Record = BTreeMap<String, String>;

/// 한 번의 요청으로 받은 행 구간.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Record>,
    /// 응답에 포함된 전체 행 수 (<list_total_count>). 없으면 None.
    pub total_count: Option<usize>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// UTM 평면으로 투영된 행정동/법정동 경계.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminDistrict {
    pub name: String,
    pub code: String,
    /// 닫힌 외곽 링 (easting, northing) [m]
    pub ring: Vec<(f64, f64)>,
    /// 면적 [m^2]
    pub area: f64,
    /// 면적 가중 중심점 (easting, northing) [m]
    pub centroid: (f64, f64),
}

/// 레코드에서 컬럼을 대소문자 구분 없이 찾는다.
/// (서울 열린데이터는 대문자, 가공 단계에서는 소문자 컬럼명을 쓴다)
pub fn column<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    if let Some(v) = record.get(name) {
        return Some(v.as_str());
    }
    record
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
