// crates/core/tests/patch_sources.rs

use rompatch_core::model::DIFF_MAGIC;
use rompatch_core::source::{DirectoryPatchSource, HttpPatchSource, PatchSource};
use rompatch_core::{digest, PatchError, PatchKey, Region};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn valid_patch() -> Vec<u8> {
    let mut bytes = DIFF_MAGIC.to_vec();
    bytes.extend_from_slice(&[0x00, 0x00, 0x01, 0x02]);
    bytes
}

#[tokio::test]
async fn directory_source_resolves_store_layout() {
    let tmp = tempdir().expect("temp dir");
    let rom_digest = digest(b"dirty");
    let clean = PatchKey::Clean { region: Region::Us, digest: rom_digest };
    let transition = PatchKey::Transition { from: Region::Eu, to: Region::Us };
    let target = PatchKey::Target { location: "./xdelta/chip2.xdelta".into() };

    let source = DirectoryPatchSource::new(tmp.path());
    let clean_path = tmp.path().join(format!("patches/us/from/{}.xdelta", rom_digest.to_upper_hex()));
    assert_eq!(source.path_for(&clean), clean_path);
    assert_eq!(source.path_for(&transition), tmp.path().join("patches/eu-to-us.xdelta"));
    assert_eq!(source.path_for(&target), tmp.path().join("xdelta/chip2.xdelta"));

    for path in [clean_path, source.path_for(&transition), source.path_for(&target)] {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, valid_patch()).unwrap();
    }

    for key in [clean, transition, target] {
        let diff = source.fetch(&key).await.expect("fetch");
        assert_eq!(diff.as_bytes(), valid_patch().as_slice());
    }
}

#[tokio::test]
async fn directory_source_classifies_missing_and_corrupt_files() {
    let tmp = tempdir().expect("temp dir");
    let source = DirectoryPatchSource::new(tmp.path());

    let missing = PatchKey::Transition { from: Region::Us, to: Region::Eu };
    let err = source.fetch(&missing).await.unwrap_err();
    assert!(matches!(err, PatchError::PatchNotFound { ref key } if key == "us-to-eu"));

    let bogus = PatchKey::Target { location: "bogus.xdelta".into() };
    std::fs::write(tmp.path().join("bogus.xdelta"), b"PK\x03\x04").unwrap();
    let err = source.fetch(&bogus).await.unwrap_err();
    assert!(matches!(err, PatchError::CorruptPatch { .. }));

    // A directory where a file is expected is an I/O failure, not a miss.
    let dir_key = PatchKey::Target { location: "adir".into() };
    std::fs::create_dir(tmp.path().join("adir")).unwrap();
    let err = source.fetch(&dir_key).await.unwrap_err();
    assert!(matches!(err, PatchError::Transport { status: None, .. }), "got {err:?}");
}

/// Serve one canned HTTP response per connection, forever.
async fn serve(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/player")
}

#[tokio::test]
async fn http_source_fetches_valid_patch() {
    let base = serve("200 OK", valid_patch()).await;
    let source = HttpPatchSource::new(&base).expect("source");
    let key = PatchKey::Transition { from: Region::Eu, to: Region::Us };

    assert_eq!(source.url_for(&key).unwrap().path(), "/player/patches/eu-to-us.xdelta");
    let diff = source.fetch(&key).await.expect("fetch");
    assert_eq!(diff.len(), valid_patch().len());
}

#[tokio::test]
async fn http_source_maps_404_to_not_found() {
    let base = serve("404 Not Found", Vec::new()).await;
    let source = HttpPatchSource::new(&base).expect("source");
    let key = PatchKey::Clean { region: Region::Eu, digest: digest(b"x") };

    let err = source.fetch(&key).await.unwrap_err();
    assert!(matches!(err, PatchError::PatchNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn http_source_maps_server_error_to_transport_with_status() {
    let base = serve("500 Internal Server Error", b"oops".to_vec()).await;
    let source = HttpPatchSource::new(&base).expect("source");
    let key = PatchKey::Target { location: "xdelta/blorg.xdelta".into() };

    let err = source.fetch(&key).await.unwrap_err();
    assert!(matches!(err, PatchError::Transport { status: Some(500), .. }), "got {err:?}");
    assert!(err.to_string().contains("code 500"));
}

#[tokio::test]
async fn http_source_rejects_non_vcdiff_body() {
    let base = serve("200 OK", b"<html>not a patch</html>".to_vec()).await;
    let source = HttpPatchSource::new(&base).expect("source");
    let key = PatchKey::Target { location: "xdelta/blorg.xdelta".into() };

    let err = source.fetch(&key).await.unwrap_err();
    assert!(matches!(err, PatchError::CorruptPatch { .. }), "got {err:?}");
}

#[tokio::test]
async fn http_source_maps_refused_connection_to_transport_without_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let source = HttpPatchSource::new(&format!("http://{addr}/")).expect("source");
    let key = PatchKey::Transition { from: Region::Us, to: Region::Eu };
    let err = source.fetch(&key).await.unwrap_err();
    assert!(matches!(err, PatchError::Transport { status: None, .. }), "got {err:?}");
}

#[test]
fn http_source_keeps_absolute_target_urls() {
    let source = HttpPatchSource::new("https://hacks.example.org/player").expect("source");
    let key = PatchKey::Target { location: "https://cdn.example.org/hack.xdelta".into() };
    assert_eq!(source.url_for(&key).unwrap().as_str(), "https://cdn.example.org/hack.xdelta");

    let relative = PatchKey::Target { location: "./xdelta/chip2.xdelta".into() };
    assert_eq!(
        source.url_for(&relative).unwrap().as_str(),
        "https://hacks.example.org/player/xdelta/chip2.xdelta"
    );
}

#[test]
fn http_source_construction_reports_errors_instead_of_panicking() {
    let err = HttpPatchSource::new("not a url").unwrap_err();
    assert!(err.contains("invalid base URL 'not a url'"), "got {err}");

    let source = HttpPatchSource::new("http://127.0.0.1:9").expect("source");
    assert_eq!(source.base_url().as_str(), "http://127.0.0.1:9/");
}
