//! Syslog 파서 — RFC 3164 / RFC 5424 자동 판별
//!
//! 디코딩된 텍스트 한 줄을 [`ParsedMessage`]로 변환합니다.
//!
//! # 판별 규칙
//! 1. `<`로 시작하지 않으면 비정형 입력으로 취급 (PRI 기본값 13, RFC 3164)
//! 2. `<NN>` (1–3자리, 0–191)을 읽는다. 형식 위반이면 1과 동일
//! 3. `>` 바로 뒤가 숫자 한 자리 + 공백이면 RFC 5424, 아니면 RFC 3164
//!
//! 파서는 상태와 I/O를 갖지 않는 순수 함수이며, 어떤 입력에도 실패하지
//! 않습니다. 본문이 깨진 경우에도 PRI가 온전하면 PRI를 유지한 채
//! 본문 전체를 메시지로 삼아 레코드를 만들어 냅니다.

use std::net::IpAddr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

use logwell_core::types::{DEFAULT_PRI, Facility, MAX_PRI, ParsedMessage, Severity, SyslogFormat};

/// Syslog 파서
///
/// 상태가 없으므로 여러 수신기에서 자유롭게 인스턴스를 만들어 써도 됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogParser;

impl SyslogParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 텍스트 한 줄을 파싱하여 레코드를 생성합니다.
    ///
    /// `received_at`은 호출 시각(파이프라인 진입 시각)으로 기록됩니다.
    pub fn parse(&self, line: &str, source_ip: IpAddr) -> ParsedMessage {
        let received_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        match extract_pri(line) {
            Some((priority, rest)) => {
                let bytes = rest.as_bytes();
                if bytes.len() >= 2 && bytes[0].is_ascii_digit() && bytes[1] == b' ' {
                    parse_rfc5424(priority, &rest[2..], line, source_ip, received_at)
                } else {
                    parse_rfc3164(priority, rest, line, source_ip, received_at)
                }
            }
            // PRI 판별 불가: 비정형 입력, user.notice로 분류
            None => build(
                DEFAULT_PRI,
                String::new(),
                String::new(),
                line.to_owned(),
                line,
                source_ip,
                received_at,
                SyslogFormat::Rfc3164,
            ),
        }
    }
}

/// `<NN>` PRI 필드를 추출합니다. 실패 시 `None` (비정형으로 처리).
fn extract_pri(line: &str) -> Option<(u8, &str)> {
    let rest = line.strip_prefix('<')?;
    let end = rest.find('>')?;
    if end == 0 || end > 3 {
        return None;
    }
    let digits = &rest[..end];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pri: u16 = digits.parse().ok()?;
    if pri > u16::from(MAX_PRI) {
        return None;
    }
    Some((pri as u8, &rest[end + 1..]))
}

#[allow(clippy::too_many_arguments)]
fn build(
    priority: u8,
    timestamp: String,
    hostname: String,
    message: String,
    raw: &str,
    source_ip: IpAddr,
    received_at: String,
    format: SyslogFormat,
) -> ParsedMessage {
    ParsedMessage {
        priority,
        facility: Facility::from_priority(priority),
        severity: Severity::from_priority(priority),
        timestamp,
        hostname,
        message,
        source_ip,
        received_at,
        format,
        raw: raw.to_owned(),
    }
}

/// RFC 5424 본문을 파싱합니다 (`VERSION SP` 이후).
///
/// 형식: `TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA [SP MSG]`
///
/// 헤더 토큰이 모자라면 PRI만 유지하고 본문 전체를 메시지로 삼습니다.
fn parse_rfc5424(
    priority: u8,
    body: &str,
    raw: &str,
    source_ip: IpAddr,
    received_at: String,
) -> ParsedMessage {
    let mut parts = body.splitn(6, ' ');
    let header: Option<[&str; 5]> = (|| {
        Some([
            parts.next()?,
            parts.next()?,
            parts.next()?,
            parts.next()?,
            parts.next()?,
        ])
    })();

    let Some([timestamp_tok, hostname_tok, _app_name, _proc_id, _msg_id]) = header else {
        // 헤더 불완전: 경고 수준의 degrade, 레코드는 유지
        return build(
            priority,
            String::new(),
            String::new(),
            body.to_owned(),
            raw,
            source_ip,
            received_at,
            SyslogFormat::Rfc5424,
        );
    };

    let timestamp = normalize_rfc3339(timestamp_tok);
    let hostname = nilvalue_to_empty(hostname_tok).to_owned();

    let message = match parts.next() {
        None => String::new(),
        Some(sd_and_msg) => {
            if sd_and_msg == "-" {
                String::new()
            } else if let Some(msg) = sd_and_msg.strip_prefix("- ") {
                msg.to_owned()
            } else if sd_and_msg.starts_with('[') {
                skip_structured_data(sd_and_msg)
            } else {
                // SD 형식이 아님: 전체를 메시지로
                sd_and_msg.to_owned()
            }
        }
    };

    build(
        priority,
        timestamp,
        hostname,
        message,
        raw,
        source_ip,
        received_at,
        SyslogFormat::Rfc5424,
    )
}

/// RFC 3164 본문을 파싱합니다 (`>` 이후).
///
/// 형식: `MMM dd HH:MM:SS HOSTNAME MSG`
/// 타임스탬프가 맞지 않으면 본문 전체를 메시지로 삼고 타임스탬프는 비웁니다.
fn parse_rfc3164(
    priority: u8,
    body: &str,
    raw: &str,
    source_ip: IpAddr,
    received_at: String,
) -> ParsedMessage {
    let (timestamp, hostname, message) = match parse_bsd_timestamp(body) {
        Some((iso, after_ts)) => {
            let rest = after_ts.strip_prefix(' ').unwrap_or(after_ts);
            let mut tokens = rest.splitn(2, ' ');
            let hostname = tokens.next().unwrap_or("").to_owned();
            let message = tokens.next().unwrap_or("").to_owned();
            (iso, hostname, message)
        }
        None => (String::new(), String::new(), body.to_owned()),
    };

    build(
        priority,
        timestamp,
        hostname,
        message,
        raw,
        source_ip,
        received_at,
        SyslogFormat::Rfc3164,
    )
}

/// NILVALUE (`-`)를 빈 문자열로 변환합니다.
fn nilvalue_to_empty(value: &str) -> &str {
    if value == "-" { "" } else { value }
}

/// RFC 3339 타임스탬프를 정규화합니다. NIL이거나 파싱 불가면 빈 문자열.
fn normalize_rfc3339(token: &str) -> String {
    if token == "-" {
        return String::new();
    }
    match DateTime::parse_from_rfc3339(token) {
        Ok(dt) => dt.to_rfc3339_opts(SecondsFormat::Micros, true),
        Err(_) => String::new(),
    }
}

/// STRUCTURED-DATA 블록들을 건너뛰고 메시지를 반환합니다.
///
/// SD는 하나 이상의 `[...]` 그룹으로 구성되며, 따옴표 안의
/// 백슬래시 이스케이프와 괄호를 구분해야 합니다. 닫히지 않은 SD는
/// 전체가 SD로 간주되어 메시지는 비게 됩니다.
fn skip_structured_data(input: &str) -> String {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;

    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '[' if !in_quote => depth += 1,
            ']' if !in_quote => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let rest = &input[idx + 1..];
                    // 다음 SD 그룹이 이어지면 계속 스캔
                    if rest.starts_with('[') {
                        continue;
                    }
                    return rest.strip_prefix(' ').unwrap_or(rest).to_owned();
                }
            }
            _ => {}
        }
    }

    String::new()
}

/// BSD 타임스탬프(`MMM dd HH:MM:SS`)를 파싱합니다.
///
/// 일(day)은 공백 패딩(`Oct  1`)을 허용합니다. 현지 시각 기준 현재 연도를
/// 붙여 ISO-8601 문자열로 변환하고, 소비한 바이트 이후의 나머지를 함께
/// 반환합니다.
fn parse_bsd_timestamp(body: &str) -> Option<(String, &str)> {
    let month = match body.get(0..3)? {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    let rest = body.get(3..)?.strip_prefix(' ')?;

    // 공백 패딩된 일자 처리
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let day_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if day_len == 0 || day_len > 2 {
        return None;
    }
    let day: u32 = rest[..day_len].parse().ok()?;
    let rest = rest[day_len..].strip_prefix(' ')?;

    let time_str = rest.get(0..8)?;
    let time = NaiveTime::parse_from_str(time_str, "%H:%M:%S").ok()?;
    let rest = &rest[8..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }

    let year = Local::now().year();
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive = date.and_time(time);
    let dt = Local
        .from_local_datetime(&naive)
        .single()
        .or_else(|| Local.from_local_datetime(&naive).earliest())?;

    Some((dt.to_rfc3339_opts(SecondsFormat::Secs, false), rest))
}
