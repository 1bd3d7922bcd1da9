//! 행정동(adstrd) <-> 법정동(legald) 코드 매핑과 소득 통계 조인.
//!
//! 행정동과 법정동은 1:1로 맞지 않아서 KIKmix 매핑표를 거쳐야
//! 두 체계로 집계된 데이터를 합칠 수 있다.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{column, Record};

pub const SIDO_COLUMN: &str = "시도명";
pub const ADSTRD_COLUMN: &str = "행정동코드";
pub const LEGALD_COLUMN: &str = "법정동코드";

/// KIKmix 표에서 읽은 (행정동코드, 법정동코드) 쌍 목록.
/// 코드는 말단 2자리를 뗀 8자리 양식으로 정규화된다.
#[derive(Debug, Clone, Default)]
pub struct CodeMapping {
    pairs: Vec<(String, String)>,
}

impl CodeMapping {
    pub fn from_csv_path(path: impl AsRef<Path>, sido_prefix: Option<&str>) -> Result<Self> {
        Self::from_csv(csv::Reader::from_path(path)?, sido_prefix)
    }

    pub fn from_reader<R: Read>(reader: R, sido_prefix: Option<&str>) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader), sido_prefix)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, sido_prefix: Option<&str>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let sido_index = header_position(&headers, SIDO_COLUMN);
        let adstrd_index =
            header_position(&headers, ADSTRD_COLUMN).ok_or(Error::MissingField(ADSTRD_COLUMN))?;
        let legald_index =
            header_position(&headers, LEGALD_COLUMN).ok_or(Error::MissingField(LEGALD_COLUMN))?;

        let mut pairs = Vec::new();
        for row in reader.records() {
            let row = row?;

            if let Some(prefix) = sido_prefix {
                let sido = sido_index.and_then(|i| row.get(i)).unwrap_or("");
                if !sido.starts_with(prefix) {
                    continue;
                }
            }

            let adstrd = trim_code(row.get(adstrd_index).unwrap_or("").trim());
            let legald = trim_code(row.get(legald_index).unwrap_or("").trim());
            if adstrd.is_empty() || legald.is_empty() {
                continue;
            }
            pairs.push((adstrd.to_string(), legald.to_string()));
        }

        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn header_position(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// 말단 2자리(리 단위)를 떼어 API 코드 양식과 맞춘다.
fn trim_code(code: &str) -> &str {
    if code.len() > 2 && code.chars().all(|c| c.is_ascii_digit()) {
        &code[..code.len() - 2]
    } else {
        code
    }
}

/// 법정동코드별 평균 소득 테이블.
///
/// 행정동코드별 평균을 매핑표로 법정동에 모아 다시 평균 내고,
/// 매핑에 없는 법정동은 전체 평균으로 대신한다.
#[derive(Debug, Clone)]
pub struct IncomeByDistrict {
    by_legal: BTreeMap<String, f64>,
    default: f64,
}

impl IncomeByDistrict {
    pub fn from_records(
        records: &[Record],
        mapping: &CodeMapping,
        code_column: &str,
        value_column: &str,
    ) -> Self {
        // 행정동코드별 평균 (숫자가 아닌 값은 건너뜀)
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        let mut grand_sum = 0.0;
        let mut grand_count = 0usize;

        for record in records {
            let Some(code) = column(record, code_column) else {
                continue;
            };
            let Some(value) = column(record, value_column).and_then(|v| v.trim().parse::<f64>().ok())
            else {
                continue;
            };

            let entry = sums.entry(code).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
            grand_sum += value;
            grand_count += 1;
        }

        let by_adstrd: BTreeMap<&str, f64> = sums
            .into_iter()
            .map(|(code, (sum, count))| (code, sum / count as f64))
            .collect();
        let default = if grand_count == 0 {
            0.0
        } else {
            grand_sum / grand_count as f64
        };

        // 법정동 하나 = 행정동 여럿. 매핑된 행정동 평균들의 평균을 취한다
        let mut legal_sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for (adstrd, legald) in mapping.pairs() {
            if let Some(&income) = by_adstrd.get(adstrd.as_str()) {
                let entry = legal_sums.entry(legald.as_str()).or_insert((0.0, 0));
                entry.0 += income;
                entry.1 += 1;
            }
        }

        let by_legal = legal_sums
            .into_iter()
            .map(|(code, (sum, count))| (code.to_string(), sum / count as f64))
            .collect();

        Self { by_legal, default }
    }

    /// 법정동코드의 평균 소득. 데이터가 없으면 전체 평균.
    pub fn get(&self, legald_cd: &str) -> f64 {
        self.by_legal
            .get(legald_cd)
            .copied()
            .unwrap_or(self.default)
    }

    /// 매핑으로 실제 값을 얻은 법정동만.
    pub fn known(&self, legald_cd: &str) -> Option<f64> {
        self.by_legal.get(legald_cd).copied()
    }

    pub fn default_income(&self) -> f64 {
        self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.by_legal.iter().map(|(code, &income)| (code.as_str(), income))
    }
}
