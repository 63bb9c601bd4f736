use std::fs;
use std::path::Path;

use rompatch::{canonicalize_or_current, display_file_name, infer_workspace_name, read_image};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current("does/not/exist/yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does/not/exist/yet"));
}

#[test]
fn infer_workspace_name_uses_last_path_component() {
    assert_eq!(infer_workspace_name(Path::new("/tmp/hacks")), "hacks");
    assert_eq!(infer_workspace_name(Path::new("/")), "unnamed-workspace");
}

#[test]
fn read_image_reports_missing_file() {
    let tmp = tempdir().expect("tempdir");
    let err = read_image(&tmp.path().join("missing.nds")).unwrap_err();
    assert!(err.to_string().contains("Failed to read ROM file"));

    let rom = tmp.path().join("pmd.nds");
    fs::write(&rom, [1u8, 2, 3]).unwrap();
    assert_eq!(read_image(&rom).unwrap().len(), 3);
    assert_eq!(display_file_name(&rom), "pmd.nds");
}
