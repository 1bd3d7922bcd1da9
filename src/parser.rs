//! 서울 열린데이터 광장 XML 응답 -> [`Page`].
//!
//! 응답 트리 어딘가의 `<row>` 요소 하나가 레코드 하나가 되고,
//! `<list_total_count>`가 있으면 전체 행 수로 읽는다.
//! `<RESULT>`의 코드가 INFO-000이 아니고 메시지도 정상 처리가 아니면
//! 원격 서비스 오류로 돌려준다.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::{Page, Record};

const SUCCESS_CODE: &str = "INFO-000";

pub fn parse_rows_xml(xml: &str) -> Result<Page> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut rows: Vec<Record> = Vec::new();
    let mut total_count: Option<usize> = None;

    let mut in_row = false;
    let mut current = Record::new();
    let mut field: Option<String> = None;

    let mut in_total_count = false;
    let mut in_result = false;
    let mut in_code = false;
    let mut in_message = false;
    let mut code = String::new();
    let mut message = String::new();

    loop {
        match reader.read_event().map_err(quick_xml::Error::from)? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if in_row {
                    // 텍스트가 없는 컬럼도 빈 문자열로 남긴다
                    current.insert(tag.clone(), String::new());
                    field = Some(tag);
                } else {
                    match tag.as_str() {
                        "row" => {
                            in_row = true;
                            current = Record::new();
                        }
                        "list_total_count" => in_total_count = true,
                        "RESULT" => in_result = true,
                        "CODE" if in_result => in_code = true,
                        "MESSAGE" if in_result => in_message = true,
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                // <COL/> -> 빈 문자열
                if in_row {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    current.insert(tag, String::new());
                }
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if in_row {
                    if field.as_deref() == Some(tag.as_str()) {
                        field = None;
                    } else if tag == "row" {
                        in_row = false;
                        rows.push(std::mem::take(&mut current));
                    }
                } else {
                    match tag.as_str() {
                        "list_total_count" => in_total_count = false,
                        "RESULT" => in_result = false,
                        "CODE" => in_code = false,
                        "MESSAGE" => in_message = false,
                        _ => {}
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(quick_xml::Error::from)?;
                absorb_text(
                    text.trim(),
                    in_row,
                    &field,
                    &mut current,
                    in_total_count,
                    &mut total_count,
                    in_code,
                    &mut code,
                    in_message,
                    &mut message,
                );
            }
            Event::CData(e) => {
                // 메시지가 CDATA로 감싸져 오는 경우가 있다
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                absorb_text(
                    text.trim(),
                    in_row,
                    &field,
                    &mut current,
                    in_total_count,
                    &mut total_count,
                    in_code,
                    &mut code,
                    in_message,
                    &mut message,
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !code.is_empty() && code != SUCCESS_CODE && !message.contains("정상") {
        return Err(Error::Remote { code, message });
    }

    Ok(Page { rows, total_count })
}

#[allow(clippy::too_many_arguments)]
fn absorb_text(
    text: &str,
    in_row: bool,
    field: &Option<String>,
    current: &mut Record,
    in_total_count: bool,
    total_count: &mut Option<usize>,
    in_code: bool,
    code: &mut String,
    in_message: bool,
    message: &mut String,
) {
    if in_row {
        if let Some(name) = field {
            current.insert(name.clone(), text.to_string());
        }
    } else if in_total_count {
        // 숫자가 아니면 total 미상으로 둔다
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            *total_count = text.parse().ok();
        }
    } else if in_code {
        *code = text.to_string();
    } else if in_message {
        *message = text.to_string();
    }
}
