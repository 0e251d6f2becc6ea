//! 도메인 타입 — 수신된 syslog 레코드와 분류 체계
//!
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.
//! [`ParsedMessage`]는 파서가 생성한 뒤 변경되지 않으며,
//! JSON 직렬화 시 필드 선언 순서 그대로 한 줄짜리 객체가 됩니다.

use std::fmt;
use std::net::IpAddr;

use serde::{Serialize, Serializer};

/// RFC 5424에서 유효한 최대 PRI 값
///
/// facility 최댓값 23 * 8 + severity 최댓값 7 = 191
pub const MAX_PRI: u8 = 191;

/// PRI를 판별할 수 없을 때 사용하는 기본값 (user.notice)
pub const DEFAULT_PRI: u8 = 13;

/// Syslog facility — 메시지 출처 분류
///
/// PRI 상위 비트(`priority >> 3`)에서 파생됩니다.
/// 0–23은 표준 이름으로, 그 외 코드는 `facility{n}` 형태로 렌더링됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    Authpriv,
    Ftp,
    Ntp,
    Security,
    Console,
    SolarisCron,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
    /// 표준 범위를 벗어난 facility 코드
    Other(u8),
}

impl Facility {
    /// PRI 값에서 facility를 파생합니다 (`priority >> 3`).
    pub fn from_priority(priority: u8) -> Self {
        match priority >> 3 {
            0 => Self::Kern,
            1 => Self::User,
            2 => Self::Mail,
            3 => Self::Daemon,
            4 => Self::Auth,
            5 => Self::Syslog,
            6 => Self::Lpr,
            7 => Self::News,
            8 => Self::Uucp,
            9 => Self::Cron,
            10 => Self::Authpriv,
            11 => Self::Ftp,
            12 => Self::Ntp,
            13 => Self::Security,
            14 => Self::Console,
            15 => Self::SolarisCron,
            16 => Self::Local0,
            17 => Self::Local1,
            18 => Self::Local2,
            19 => Self::Local3,
            20 => Self::Local4,
            21 => Self::Local5,
            22 => Self::Local6,
            23 => Self::Local7,
            code => Self::Other(code),
        }
    }

    /// 표준 facility의 심볼릭 이름을 반환합니다.
    ///
    /// `Other`는 고정 이름이 없으므로 `None`을 반환합니다 (`Display` 참조).
    pub fn name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::Authpriv => "authpriv",
            Self::Ftp => "ftp",
            Self::Ntp => "ntp",
            Self::Security => "security",
            Self::Console => "console",
            Self::SolarisCron => "solaris-cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
            Self::Other(_) => return None,
        })
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, Self::Other(code)) => write!(f, "facility{code}"),
            (None, _) => Ok(()),
        }
    }
}

impl Serialize for Facility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Syslog severity — 메시지 긴급도 분류 (RFC 5424 §6.2.1)
///
/// PRI 하위 3비트(`priority & 7`)에서 파생됩니다.
/// 심각도마다 출력 파일(`<name>.log`)이 하나씩 대응됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// 여덟 심각도 전체, 숫자 코드 순서대로.
    pub const ALL: [Self; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// PRI 값에서 severity를 파생합니다 (`priority & 7`).
    pub fn from_priority(priority: u8) -> Self {
        match priority & 0x07 {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// 심볼릭 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// 이 심각도의 레코드가 기록되는 파일 이름을 반환합니다.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency.log",
            Self::Alert => "alert.log",
            Self::Critical => "critical.log",
            Self::Error => "error.log",
            Self::Warning => "warning.log",
            Self::Notice => "notice.log",
            Self::Info => "info.log",
            Self::Debug => "debug.log",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 판별된 wire 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogFormat {
    /// 레거시 BSD 형식
    Rfc3164,
    /// 구조화된 현대 형식
    Rfc5424,
}

impl SyslogFormat {
    /// 직렬화에 쓰이는 고정 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rfc3164 => "RFC3164",
            Self::Rfc5424 => "RFC5424",
        }
    }
}

impl fmt::Display for SyslogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SyslogFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 파싱된 syslog 레코드
///
/// 파서가 생성한 뒤 변경되지 않습니다. JSON 직렬화 시 필드 선언 순서가
/// 곧 키 순서이며, 타임스탬프는 항상 문자열로 직렬화됩니다.
///
/// 불변식: `facility`와 `severity`는 언제나 `priority`에서 파생된 값입니다.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedMessage {
    /// wire PRI 값 (0–191)
    pub priority: u8,
    /// `priority >> 3`에서 파생된 facility
    pub facility: Facility,
    /// `priority & 7`에서 파생된 severity
    pub severity: Severity,
    /// wire 타임스탬프의 정규화된 ISO-8601 문자열 (없거나 파싱 불가 시 빈 문자열)
    pub timestamp: String,
    /// 호스트명 (빈 문자열 가능)
    pub hostname: String,
    /// 자유 텍스트 본문
    pub message: String,
    /// 전송 소켓에서 관측된 상대 주소
    pub source_ip: IpAddr,
    /// 파이프라인 진입 시각, 마이크로초 단위 ISO-8601
    pub received_at: String,
    /// 판별된 wire 형식
    pub format: SyslogFormat,
    /// 수신된 wire 문자열 전체
    pub raw: String,
}

impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}.{}] {} {}: {}",
            self.facility, self.severity, self.source_ip, self.hostname, self.message,
        )
    }
}
