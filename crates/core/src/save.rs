//! Read-only view over a game save file.
//!
//! Only a handful of fields at fixed offsets are exposed. Strings are
//! Windows-1252 with NUL padding.

use encoding_rs::WINDOWS_1252;
use serde::Serialize;
use thiserror::Error;

const HERO_NAME_OFFSET: usize = 0x13F;
const PARTNER_NAME_OFFSET: usize = 0x149;
const TEAM_NAME_OFFSET: usize = 0x994E;
const NAME_LEN: usize = 10;
const ADVENTURES_OFFSET: usize = 0x8B70;
const PLAY_TIME_OFFSET: usize = 0x9960;

/// Play time is stored in 1/64 second ticks.
const PLAY_TIME_TICKS_PER_SECOND: f64 = 64.0;

/// Smallest buffer that contains every field.
pub const MIN_SAVE_LEN: usize = PLAY_TIME_OFFSET + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("Save file too short: {found} bytes, need at least {required}")]
    TooShort { found: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveRecord {
    pub hero_name: String,
    pub partner_name: String,
    pub team_name: String,
    pub adventures: u32,
    pub play_time_seconds: f64,
}

impl SaveRecord {
    pub fn read(buffer: &[u8]) -> Result<Self, SaveError> {
        if buffer.len() < MIN_SAVE_LEN {
            return Err(SaveError::TooShort { found: buffer.len(), required: MIN_SAVE_LEN });
        }
        Ok(Self {
            hero_name: read_name(buffer, HERO_NAME_OFFSET),
            partner_name: read_name(buffer, PARTNER_NAME_OFFSET),
            team_name: read_name(buffer, TEAM_NAME_OFFSET),
            adventures: read_u32(buffer, ADVENTURES_OFFSET),
            play_time_seconds: f64::from(read_u32(buffer, PLAY_TIME_OFFSET))
                / PLAY_TIME_TICKS_PER_SECOND,
        })
    }

    /// Play time as `H:MM:SS`, truncating fractional seconds.
    pub fn play_time_hms(&self) -> String {
        let total = self.play_time_seconds as u64;
        format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
    }
}

fn read_name(buffer: &[u8], offset: usize) -> String {
    let (text, _, _) = WINDOWS_1252.decode(&buffer[offset..offset + NAME_LEN]);
    text.replace('\0', "")
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buffer[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    #[test]
    fn reads_fixed_offsets() {
        let mut buf = vec![0u8; MIN_SAVE_LEN];
        put(&mut buf, HERO_NAME_OFFSET, b"Riolu");
        put(&mut buf, PARTNER_NAME_OFFSET, b"Pikachu");
        put(&mut buf, TEAM_NAME_OFFSET, b"Poffins");
        put(&mut buf, ADVENTURES_OFFSET, &42u32.to_le_bytes());
        put(&mut buf, PLAY_TIME_OFFSET, &(3_725u32 * 64 + 32).to_le_bytes());

        let record = SaveRecord::read(&buf).unwrap();
        assert_eq!(record.hero_name, "Riolu");
        assert_eq!(record.partner_name, "Pikachu");
        assert_eq!(record.team_name, "Poffins");
        assert_eq!(record.adventures, 42);
        assert_eq!(record.play_time_seconds, 3_725.5);
        assert_eq!(record.play_time_hms(), "1:02:05");
    }

    #[test]
    fn decodes_windows_1252() {
        let mut buf = vec![0u8; MIN_SAVE_LEN];
        // 0xE9 is 'é' and 0x80 is '€' in Windows-1252.
        put(&mut buf, HERO_NAME_OFFSET, &[b'J', 0xE9, b'r', 0x80]);
        let record = SaveRecord::read(&buf).unwrap();
        assert_eq!(record.hero_name, "Jér€");
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = SaveRecord::read(&[0u8; 16]).unwrap_err();
        assert_eq!(err, SaveError::TooShort { found: 16, required: MIN_SAVE_LEN });
    }
}
