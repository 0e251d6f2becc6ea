//! 설정 관리 — logwell.toml 파싱 및 `SYSLOG_*` 환경 변수 오버라이드
//!
//! 설정은 세 단계로 결정됩니다: 내장 기본값 → 설정 파일(있을 경우) →
//! 환경 변수. 환경 변수 키와 기본값은 배포 환경과의 호환을 위해
//! 고정되어 있습니다 ([`LogwellConfig::apply_env_overrides`] 참조).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Logwell 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogwellConfig {
    /// 일반 설정
    pub general: GeneralConfig,
    /// syslog 수신 설정
    pub syslog: SyslogConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// syslog 수신 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// 바인드 인터페이스
    pub bind_host: String,
    /// UDP 수신 포트
    pub udp_port: u16,
    /// TLS 수신 포트
    pub tls_port: u16,
    /// 출력 디렉토리
    pub log_dir: String,
    /// TLS 서버 인증서 (PEM)
    pub cert_file: String,
    /// TLS 개인 키 (PEM)
    pub key_file: String,
    /// UDP 수신기 활성화 여부
    pub enable_udp: bool,
    /// TLS 수신기 활성화 여부
    pub enable_tls: bool,
    /// 중복 제거 윈도우 (초)
    pub dedup_window_secs: u64,
    /// 중복 제거 맵 최대 엔트리 수
    pub dedup_max_entries: usize,
    /// 프레임 최대 크기 (바이트)
    pub max_frame_bytes: usize,
    /// 연결당 수신 버퍼 상한 (바이트)
    pub max_buffer_bytes: usize,
    /// 최대 동시 TLS 세션 수
    pub max_connections: usize,
    /// 연결 비활성 타임아웃 (초)
    pub read_timeout_secs: u64,
    /// 종료 시 진행 중 작업 유예 기간 (초)
    pub shutdown_grace_secs: u64,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_owned(),
            udp_port: 514,
            tls_port: 6514,
            log_dir: "logs".to_owned(),
            cert_file: "cert.pem".to_owned(),
            key_file: "key.pem".to_owned(),
            enable_udp: true,
            enable_tls: true,
            dedup_window_secs: 600,
            dedup_max_entries: 100_000,
            max_frame_bytes: 64 * 1024,
            max_buffer_bytes: 1024 * 1024,
            max_connections: 100,
            read_timeout_secs: 300,
            shutdown_grace_secs: 2,
        }
    }
}

impl LogwellConfig {
    /// 설정 파일을 읽어 설정을 생성합니다.
    ///
    /// 파일이 존재하지 않으면 내장 기본값을 사용합니다.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(&contents)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 프로세스 환경 변수의 `SYSLOG_*` 키로 설정을 덮어씁니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 주입된 lookup으로 `SYSLOG_*` 오버라이드를 적용합니다.
    ///
    /// 테스트에서 프로세스 환경을 건드리지 않고 오버라이드를 검증할 수 있도록
    /// lookup 함수를 분리합니다.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("SYSLOG_UDP_PORT") {
            self.syslog.udp_port = parse_number("SYSLOG_UDP_PORT", &value)?;
        }
        if let Some(value) = lookup("SYSLOG_TLS_PORT") {
            self.syslog.tls_port = parse_number("SYSLOG_TLS_PORT", &value)?;
        }
        if let Some(value) = lookup("SYSLOG_LOG_DIR") {
            self.syslog.log_dir = value;
        }
        if let Some(value) = lookup("SYSLOG_CERT_FILE") {
            self.syslog.cert_file = value;
        }
        if let Some(value) = lookup("SYSLOG_KEY_FILE") {
            self.syslog.key_file = value;
        }
        if let Some(value) = lookup("SYSLOG_ENABLE_UDP") {
            self.syslog.enable_udp = parse_bool(&value);
        }
        if let Some(value) = lookup("SYSLOG_ENABLE_TLS") {
            self.syslog.enable_tls = parse_bool(&value);
        }
        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.syslog.log_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "syslog.log_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.syslog.dedup_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.dedup_window_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.syslog.dedup_max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.dedup_max_entries".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.syslog.max_frame_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.max_frame_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.syslog.max_buffer_bytes < self.syslog.max_frame_bytes {
            return Err(ConfigError::InvalidValue {
                field: "syslog.max_buffer_bytes".to_owned(),
                reason: "must be at least max_frame_bytes".to_owned(),
            });
        }
        if self.syslog.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.max_connections".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.syslog.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.read_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        match self.general.log_format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "general.log_format".to_owned(),
                    reason: format!("unknown format '{other}' (expected json or pretty)"),
                });
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: format!("'{value}' is not a valid number"),
    })
}

/// `"true"`(대소문자 무관)만 참으로 해석합니다.
fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
