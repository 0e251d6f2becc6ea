//! Octet-counted 스트림 프레이머
//!
//! TCP/TLS 바이트 스트림에서 `<십진 길이><SP><본문>` 규약의 프레임을
//! 복원합니다. 읽기가 어떤 단위로 쪼개져 도착하든 결과는 동일하며
//! (단편화 불변성), 프로토콜 위반은 연결 치명적 에러로 보고합니다.
//!
//! 개행 구분 프레이밍 폴백은 의도적으로 없습니다. 길이 접두어가 깨진
//! 스트림에서 바이트를 건너뛰며 복구를 시도하면 이후 프레임 전체가
//! 쓰레기로 파싱되므로, 연결을 닫는 쪽이 안전합니다.

use bytes::{Buf, BytesMut};

use crate::error::FrameError;

/// 프레임 본문 최대 크기 기본값 (64 KiB)
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// 연결당 수신 버퍼 상한 기본값 (1 MiB)
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// 공백 없이 허용되는 접두어 구간 최대 바이트
const MAX_PREFIX_BYTES: usize = 16;

/// 길이 접두어 최대 자릿수
const MAX_PREFIX_DIGITS: usize = 10;

/// Octet-counted 프레이머
///
/// 세션마다 하나씩 생성되어 해당 세션 태스크가 단독으로 소유합니다.
#[derive(Debug)]
pub struct OctetCountFramer {
    buf: BytesMut,
    max_frame: usize,
    max_buffer: usize,
}

impl OctetCountFramer {
    /// 기본 상한으로 새 프레이머를 생성합니다.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_FRAME, DEFAULT_MAX_BUFFER)
    }

    /// 상한을 지정하여 새 프레이머를 생성합니다.
    pub fn with_limits(max_frame: usize, max_buffer: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame,
            max_buffer,
        }
    }

    /// 현재 버퍼에 쌓인 바이트 수를 반환합니다.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// 새 바이트 청크를 공급하고 완성된 프레임들을 반환합니다.
    ///
    /// 에러는 연결 치명적입니다. 호출자는 연결을 닫아야 하며,
    /// 같은 프레이머에 계속 feed해서는 안 됩니다.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameError> {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > self.max_buffer {
            return Err(FrameError::BufferOverflow {
                size: self.buf.len(),
                max: self.max_buffer,
            });
        }

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// 완성된 프레임 하나를 꺼냅니다. 데이터가 모자라면 `Ok(None)`.
    fn try_extract(&mut self) -> Result<Option<String>, FrameError> {
        let Some(space) = self.buf.iter().position(|&b| b == b' ') else {
            if self.buf.len() > MAX_PREFIX_BYTES {
                return Err(FrameError::MalformedPrefix {
                    reason: format!(
                        "no length delimiter within first {MAX_PREFIX_BYTES} bytes"
                    ),
                });
            }
            return Ok(None);
        };

        if space == 0 {
            return Err(FrameError::MalformedPrefix {
                reason: "empty length prefix".to_owned(),
            });
        }
        if space > MAX_PREFIX_DIGITS {
            return Err(FrameError::MalformedPrefix {
                reason: format!("length prefix of {space} digits (max {MAX_PREFIX_DIGITS})"),
            });
        }

        let digits = &self.buf[..space];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(FrameError::MalformedPrefix {
                reason: "non-numeric length prefix".to_owned(),
            });
        }

        // 최대 10자리이므로 u64로 충분
        let mut length: u64 = 0;
        for &b in digits {
            length = length * 10 + u64::from(b - b'0');
        }
        if length == 0 {
            return Err(FrameError::MalformedPrefix {
                reason: "zero-length frame".to_owned(),
            });
        }
        if length > self.max_frame as u64 {
            return Err(FrameError::MalformedPrefix {
                reason: format!("frame length {length} exceeds cap {}", self.max_frame),
            });
        }

        let total = space + 1 + length as usize;
        if self.buf.len() < total {
            return Ok(None);
        }

        let payload = String::from_utf8_lossy(&self.buf[space + 1..total]).into_owned();
        self.buf.advance(total);
        Ok(Some(payload))
    }
}

impl Default for OctetCountFramer {
    fn default() -> Self {
        Self::new()
    }
}
