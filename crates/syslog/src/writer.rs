//! 심각도 라우팅 기록기 — severity별 JSON 라인 파일
//!
//! 수락된 레코드를 `<log_dir>/<severity>.log` 여덟 파일 중 하나에
//! 한 줄짜리 JSON으로 추가합니다. 파일 핸들은 시작 시 한 번 열어 유지하고,
//! 파일마다 mutex를 두어 동시 기록자가 줄 중간에서 섞이지 않게 합니다.
//! fsync는 하지 않지만 매 기록마다 flush하여 `tail -f`가 즉시 볼 수 있게
//! 합니다.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use logwell_core::types::{ParsedMessage, Severity};

use crate::error::SyslogError;

struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
}

/// 심각도 라우팅 기록기
///
/// `Severity`의 여덟 값이 그대로 파일 인덱스이므로, 알 수 없는 심각도로
/// 라우팅이 실패하는 경우는 타입상 존재하지 않습니다.
pub struct SeverityWriter {
    log_dir: PathBuf,
    files: Vec<LogFile>,
}

impl SeverityWriter {
    /// 출력 디렉토리를 만들고(없을 경우) 여덟 파일을 append 모드로 엽니다.
    pub async fn open(log_dir: impl Into<PathBuf>) -> Result<Self, SyslogError> {
        let log_dir = log_dir.into();
        tokio::fs::create_dir_all(&log_dir)
            .await
            .map_err(|e| SyslogError::Write {
                path: log_dir.clone(),
                source: e,
            })?;

        let mut files = Vec::with_capacity(Severity::ALL.len());
        for severity in Severity::ALL {
            let path = log_dir.join(severity.file_name());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| SyslogError::Write {
                    path: path.clone(),
                    source: e,
                })?;
            files.push(LogFile {
                path,
                file: Mutex::new(file),
            });
        }

        Ok(Self { log_dir, files })
    }

    /// 레코드 하나를 해당 심각도 파일에 `\n`으로 끝나는 한 줄로 추가합니다.
    pub async fn write(&self, record: &ParsedMessage) -> Result<(), SyslogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let slot = &self.files[record.severity as usize];
        let mut file = slot.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| SyslogError::Write {
                path: slot.path.clone(),
                source: e,
            })?;
        file.flush().await.map_err(|e| SyslogError::Write {
            path: slot.path.clone(),
            source: e,
        })
    }

    /// 출력 디렉토리를 반환합니다.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// 주어진 심각도의 출력 파일 경로를 반환합니다.
    pub fn file_path(&self, severity: Severity) -> &Path {
        &self.files[severity as usize].path
    }
}
