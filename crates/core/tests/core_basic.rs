use rompatch_core::region::{classify, region_from_code, REGION_BYTE_OFFSET};
use rompatch_core::{version, Image, PatchError, Region};

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

#[test]
fn classification_is_total_over_header_bytes() {
    for code in 0..=u8::MAX {
        let mut bytes = vec![0u8; REGION_BYTE_OFFSET + 1];
        bytes[REGION_BYTE_OFFSET] = code;
        match classify(&Image::from(bytes)) {
            Ok(region) => assert_eq!(region_from_code(code), Some(region)),
            Err(PatchError::UnsupportedRegion { found, .. }) => assert_eq!(found, Some(code)),
            Err(other) => panic!("unexpected error for byte {code:#04x}: {other}"),
        }
    }
}

#[test]
fn truncated_header_is_rejected() {
    let err = classify(&Image::from(vec![b'E'; REGION_BYTE_OFFSET])).unwrap_err();
    assert!(matches!(err, PatchError::UnsupportedRegion { found: None, .. }));
    assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
}
