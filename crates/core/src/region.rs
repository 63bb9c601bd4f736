//! Region detection from the NDS cartridge header.
//!
//! The game code occupies header bytes `0x0C..0x10`; its last character is
//! the destination code (see GBATEK, "DS Cartridge Header").

use crate::error::PatchError;
use crate::model::{Image, Region};

/// Offset of the game-code destination character.
pub const REGION_BYTE_OFFSET: usize = 0x0F;

/// Exact-match table from destination character to region.
const REGION_TABLE: [(u8, Region); 3] = [(b'E', Region::Us), (b'P', Region::Eu), (b'J', Region::Jp)];

/// Header byte that identifies `region`.
pub fn region_code(region: Region) -> u8 {
    REGION_TABLE.iter().find(|(_, r)| *r == region).map(|(code, _)| *code).unwrap_or(b'?')
}

/// Map a raw destination byte to a region, if it is one we know.
pub fn region_from_code(code: u8) -> Option<Region> {
    REGION_TABLE.iter().find(|(c, _)| *c == code).map(|(_, r)| *r)
}

/// Classify `image` by its header region byte.
///
/// Rejection is terminal; the image is outside the supported scope.
pub fn classify(image: &Image) -> Result<Region, PatchError> {
    let found = image.as_bytes().get(REGION_BYTE_OFFSET).copied();
    found.and_then(region_from_code).ok_or_else(|| PatchError::UnsupportedRegion {
        found,
        supported: supported_list(&Region::ALL),
    })
}

/// Human-readable list such as "US, EU and JP".
pub fn supported_list(regions: &[Region]) -> String {
    let names: Vec<String> = regions.iter().map(|r| r.as_str().to_uppercase()).collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}
