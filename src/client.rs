use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Page, Record};
use crate::parser::parse_rows_xml;

pub const DEFAULT_BASE_URL: &str = "http://openapi.seoul.go.kr:8088";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// 인덱스 구간 한 페이지를 가져오는 공급원.
///
/// 페이지네이션 루프를 네트워크 없이 검증할 수 있도록 HTTP 클라이언트와
/// 분리해 둔 경계. `start`/`end`는 1-based 양끝 포함 구간이다.
pub trait PageSource {
    fn fetch_page(&self, service: &str, start: usize, end: usize) -> Result<Page>;
}

/// 서울 열린데이터 광장 OPEN API 클라이언트.
pub struct SeoulClient {
    api_key: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl SeoulClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(format!("korea-odata/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http,
        })
    }

    fn build_url(&self, service: &str, start: usize, end: usize) -> String {
        format!(
            "{}/{}/xml/{}/{}/{}/",
            self.base_url, self.api_key, service, start, end
        )
    }

    /// 단일 구간 호출.
    pub fn fetch(&self, service: &str, start: usize, end: usize) -> Result<Vec<Record>> {
        Ok(self.fetch_page(service, start, end)?.rows)
    }

    /// 자동 페이지네이션으로 전체(또는 지정량) 수집.
    pub fn fetch_all(&self, service: &str, options: &FetchOptions) -> Result<Vec<Record>> {
        collect_all(self, service, options)
    }
}

impl PageSource for SeoulClient {
    fn fetch_page(&self, service: &str, start: usize, end: usize) -> Result<Page> {
        let url = self.build_url(service, start, end);
        debug!("GET {}", url);

        let response = self.http.get(&url).send()?.error_for_status()?;
        let body = response.text()?;
        parse_rows_xml(&body)
    }
}

/// 페이지네이션 동작 설정.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// 요청당 레코드 수 (서울열린데이터는 보통 1000까지 허용)
    pub page_size: usize,
    /// 시작 인덱스 (1-based)
    pub start: usize,
    /// 끝 인덱스 (포함). 지정하면 해당 구간까지만 수집
    pub end: Option<usize>,
    /// 전체 수집 상한 (샘플만 뽑고 싶을 때)
    pub max_rows: Option<usize>,
    /// 페이지간 대기 (레이트 리밋 회피용)
    pub pause: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            start: 1,
            end: None,
            max_rows: None,
            pause: None,
        }
    }
}

/// 고정 크기 구간을 반복 요청해 순서대로 이어붙인다.
///
/// 종료 조건: 응답에 선언된 전체 행 수 도달, 요청 구간 끝 도달,
/// 빈 페이지, 수집 상한 도달. `page_size == 0`은 요청 전에 검증 오류.
pub fn collect_all(
    source: &impl PageSource,
    service: &str,
    options: &FetchOptions,
) -> Result<Vec<Record>> {
    if options.page_size == 0 {
        return Err(Error::InvalidPageSize(options.page_size));
    }

    let start = options.start.max(1);

    // 1페이지 먼저 호출하여 total_count 파악
    let first_end = match options.end {
        Some(end) => end.min(start + options.page_size - 1),
        None => start + options.page_size - 1,
    };
    let first_page = source.fetch_page(service, start, first_end)?;

    let total_count = first_page.total_count;
    if let Some(total) = total_count {
        info!("list_total_count = {}", total);
    }
    debug!(
        "fetched {} rows (start={} ~ end={})",
        first_page.rows.len(),
        start,
        first_end
    );

    // 첫 페이지가 비면 더 요청할 것이 없다
    if first_page.rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut records = first_page.rows;

    if let Some(cap) = options.max_rows {
        if records.len() >= cap {
            records.truncate(cap);
            return Ok(records);
        }
    }

    // 전체 목표량: 명시된 구간 > 선언된 총량 > 미상(빈 페이지까지)
    let target_total = match (options.end, total_count) {
        (Some(end), _) => Some((end + 1).saturating_sub(start)),
        (None, Some(total)) => Some(total.saturating_sub(start - 1)),
        (None, None) => None,
    };

    let mut next_start = first_end + 1;

    loop {
        if let Some(target) = target_total {
            if records.len() >= target {
                break;
            }
        }
        if let Some(end) = options.end {
            if next_start > end {
                break;
            }
        }

        let mut next_end = next_start + options.page_size - 1;
        if let Some(end) = options.end {
            next_end = next_end.min(end);
        }

        if let Some(pause) = options.pause {
            std::thread::sleep(pause);
        }

        let batch = source.fetch_page(service, next_start, next_end)?;
        debug!(
            "fetched {} rows (start={} ~ end={})",
            batch.rows.len(),
            next_start,
            next_end
        );

        // 더 이상 데이터가 안 나옴 (total_count를 못 얻은 경우 유용)
        if batch.rows.is_empty() {
            break;
        }

        records.extend(batch.rows);

        if let Some(cap) = options.max_rows {
            if records.len() >= cap {
                info!("reached max_rows={}, stop", cap);
                break;
            }
        }

        next_start = next_end + 1;
    }

    if let Some(cap) = options.max_rows {
        records.truncate(cap);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// 메모리 상의 행 목록을 구간으로 잘라 주는 가짜 공급원.
    struct FakeSource {
        rows: Vec<Record>,
        total: Option<usize>,
        calls: RefCell<Vec<(usize, usize)>>,
    }

    impl FakeSource {
        fn new(row_count: usize, declare_total: bool) -> Self {
            let rows = (1..=row_count)
                .map(|i| {
                    let mut record = Record::new();
                    record.insert("SEQ".to_string(), i.to_string());
                    record
                })
                .collect();
            Self {
                rows,
                total: declare_total.then_some(row_count),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl PageSource for FakeSource {
        fn fetch_page(&self, _service: &str, start: usize, end: usize) -> Result<Page> {
            self.calls.borrow_mut().push((start, end));

            let from = (start - 1).min(self.rows.len());
            let to = end.min(self.rows.len());
            let rows = if from < to {
                self.rows[from..to].to_vec()
            } else {
                Vec::new()
            };

            Ok(Page {
                rows,
                total_count: self.total,
            })
        }
    }

    fn seq_values(records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .map(|r| r.get("SEQ").unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn test_collects_all_pages_with_declared_total() {
        let source = FakeSource::new(2500, true);
        let options = FetchOptions {
            page_size: 1000,
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert_eq!(records.len(), 2500);
        assert_eq!(source.call_count(), 3);
        assert_eq!(
            source.calls.borrow().as_slice(),
            &[(1, 1000), (1001, 2000), (2001, 3000)]
        );
        // 요청 순서대로 이어붙는다
        assert_eq!(seq_values(&records), (1..=2500).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_total_stops_on_empty_page() {
        let source = FakeSource::new(150, false);
        let options = FetchOptions {
            page_size: 100,
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert_eq!(records.len(), 150);
        // 100 + 50, 그리고 빈 페이지 확인용 한 번
        assert_eq!(source.call_count(), 3);
    }

    #[test]
    fn test_empty_first_page_makes_exactly_one_request() {
        let source = FakeSource::new(0, false);
        let options = FetchOptions::default();

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert!(records.is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn test_start_beyond_total_makes_single_request() {
        let source = FakeSource::new(50, true);
        let options = FetchOptions {
            page_size: 100,
            start: 201,
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert!(records.is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn test_max_rows_smaller_than_one_page() {
        let source = FakeSource::new(500, true);
        let options = FetchOptions {
            page_size: 100,
            max_rows: Some(30),
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        // 부분 요청이 아니라 이어붙인 결과를 잘라낸다
        assert_eq!(records.len(), 30);
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.calls.borrow()[0], (1, 100));
    }

    #[test]
    fn test_max_rows_across_pages() {
        let source = FakeSource::new(1000, true);
        let options = FetchOptions {
            page_size: 100,
            max_rows: Some(250),
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert_eq!(records.len(), 250);
        assert_eq!(source.call_count(), 3);
    }

    #[test]
    fn test_explicit_end_range() {
        let source = FakeSource::new(1000, true);
        let options = FetchOptions {
            page_size: 10,
            start: 11,
            end: Some(25),
            ..Default::default()
        };

        let records = collect_all(&source, "SVC", &options).unwrap();

        assert_eq!(seq_values(&records), (11..=25).collect::<Vec<_>>());
        assert_eq!(
            source.calls.borrow().as_slice(),
            &[(11, 20), (21, 25)]
        );
    }

    #[test]
    fn test_zero_page_size_fails_before_any_request() {
        let source = FakeSource::new(100, true);
        let options = FetchOptions {
            page_size: 0,
            ..Default::default()
        };

        let err = collect_all(&source, "SVC", &options).unwrap_err();

        assert!(matches!(err, Error::InvalidPageSize(0)));
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn test_row_count_never_exceeds_cap() {
        for cap in [1, 7, 99, 100, 101, 1000] {
            let source = FakeSource::new(350, true);
            let options = FetchOptions {
                page_size: 100,
                max_rows: Some(cap),
                ..Default::default()
            };

            let records = collect_all(&source, "SVC", &options).unwrap();
            assert!(records.len() <= cap, "cap {cap} exceeded: {}", records.len());
            assert_eq!(records.len(), cap.min(350));
        }
    }

    #[test]
    fn test_remote_error_propagates() {
        struct FailingSource;
        impl PageSource for FailingSource {
            fn fetch_page(&self, _: &str, _: usize, _: usize) -> Result<Page> {
                Err(Error::Remote {
                    code: "ERROR-500".to_string(),
                    message: "서버 오류입니다.".to_string(),
                })
            }
        }

        let err = collect_all(&FailingSource, "SVC", &FetchOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
    }

    #[test]
    fn test_build_url_layout() {
        let client = SeoulClient::with_base_url("KEY", "http://openapi.seoul.go.kr:8088").unwrap();
        assert_eq!(
            client.build_url("VwsmAdstrdNcmCnsmpW", 1, 1000),
            "http://openapi.seoul.go.kr:8088/KEY/xml/VwsmAdstrdNcmCnsmpW/1/1000/"
        );
    }
}
