//! End-to-end tests driving the orchestrator against real directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::tempdir;
use walkdir::WalkDir;

use zcrypt_archive::{write_archive, ArchiveEntry};
use zcrypt_common::{Error, SecretBytes};
use zcrypt_crypto::{
    derive_key, seal, Container, DerivationConfig, Nonce, Salt, HEADER_SIZE, TAG_SIZE,
};
use zcrypt_pipeline::{Direction, Orchestrator, PipelineConfig, PipelineState};

fn test_config() -> PipelineConfig {
    PipelineConfig::default().with_derivation(DerivationConfig::new(1 << 10, 8, 1))
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(test_config())
}

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Dir(u32),
    File(u32, Vec<u8>),
}

/// Relative path -> node for everything under `root`, root included.
fn snapshot(root: &Path) -> BTreeMap<String, Node> {
    let base = root.parent().unwrap();
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(base)
                .unwrap()
                .to_string_lossy()
                .into_owned();
            let mode = mode_of(entry.path());
            let node = if entry.file_type().is_dir() {
                Node::Dir(mode)
            } else {
                Node::File(mode, fs::read(entry.path()).unwrap())
            };
            (rel, node)
        })
        .collect()
}

#[cfg(unix)]
fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(_path: &Path) -> u32 {
    0
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

fn no_staging_left(dir: &Path) -> bool {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .all(|e| !e.file_name().to_string_lossy().starts_with(".zcrypt-staging-"))
}

fn three_file_dir(parent: &Path) -> PathBuf {
    let root = parent.join("testdir");
    fs::create_dir(&root).unwrap();
    for n in 1..=3 {
        let path = root.join(format!("file{}.txt", n));
        fs::write(&path, format!("This is the content of file {}.", n)).unwrap();
    }
    set_mode(&root.join("file1.txt"), 0o600);
    set_mode(&root.join("file2.txt"), 0o640);
    set_mode(&root.join("file3.txt"), 0o755);
    root
}

#[test]
fn test_three_file_scenario() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let before = snapshot(&root);
    let mut orch = orchestrator();

    let sealed = orch
        .run(&root, &mut SecretBytes::from("mysecretpassword"))
        .unwrap();
    assert_eq!(sealed.direction, Direction::Encrypt);
    assert_eq!(sealed.output.file_name().unwrap(), "testdir.zip.enc");
    let len = fs::metadata(&sealed.output).unwrap().len() as usize;
    assert!(len > HEADER_SIZE + TAG_SIZE);

    fs::remove_dir_all(&root).unwrap();

    let failed = orch.run(&sealed.output, &mut SecretBytes::from("wrong"));
    assert!(matches!(failed, Err(Error::Authentication)));
    assert_eq!(orch.state(), PipelineState::Failed);
    assert!(!root.exists());
    assert!(no_staging_left(dir.path()));

    let opened = orch
        .run(&sealed.output, &mut SecretBytes::from("mysecretpassword"))
        .unwrap();
    assert_eq!(opened.direction, Direction::Decrypt);
    assert_eq!(orch.state(), PipelineState::Done);
    assert_eq!(snapshot(&root), before);
    assert_eq!(
        fs::read_to_string(root.join("file2.txt")).unwrap(),
        "This is the content of file 2."
    );
    assert!(no_staging_left(dir.path()));
}

#[test]
fn test_nested_tree_with_empty_directories() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("project");
    fs::create_dir_all(root.join("src/bin")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("README"), b"readme").unwrap();
    fs::write(root.join("src/lib.rs"), b"pub fn f() {}").unwrap();
    fs::write(root.join("src/bin/empty.bin"), b"").unwrap();
    set_mode(&root.join("src/bin"), 0o700);
    let before = snapshot(&root);
    let mut orch = orchestrator();

    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();
    fs::remove_dir_all(&root).unwrap();
    orch.run(&sealed.output, &mut SecretBytes::from("pw")).unwrap();

    assert_eq!(snapshot(&root), before);
}

#[test]
fn test_decrypt_refuses_existing_output() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let mut orch = orchestrator();
    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();

    fs::write(root.join("file1.txt"), b"edited since").unwrap();
    let before = snapshot(&root);

    let result = orch.run(&sealed.output, &mut SecretBytes::from("pw"));

    let err = result.unwrap_err();
    assert!(err.is_input_error());
    assert!(matches!(err, Error::OutputExists(_)));
    assert_eq!(orch.state(), PipelineState::Idle);
    assert_eq!(snapshot(&root), before);
}

#[test]
fn test_decrypt_refuses_existing_file_output() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let mut orch = orchestrator();
    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();
    fs::remove_dir_all(&root).unwrap();
    fs::write(&root, b"a file in the way").unwrap();

    let result = orch.run(&sealed.output, &mut SecretBytes::from("pw"));

    assert!(matches!(result, Err(Error::OutputExists(_))));
    assert_eq!(fs::read(&root).unwrap(), b"a file in the way");
}

#[test]
fn test_tampered_header_fails_authentication() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let mut orch = orchestrator();
    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();
    fs::remove_dir_all(&root).unwrap();

    let mut bytes = fs::read(&sealed.output).unwrap();
    bytes[0] ^= 0x01;
    fs::write(&sealed.output, &bytes).unwrap();

    let result = orch.run(&sealed.output, &mut SecretBytes::from("pw"));

    assert!(matches!(result, Err(Error::Authentication)));
    assert!(!root.exists());
}

#[test]
fn test_truncated_container_is_malformed() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let mut orch = orchestrator();
    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();
    fs::remove_dir_all(&root).unwrap();

    let bytes = fs::read(&sealed.output).unwrap();
    fs::write(&sealed.output, &bytes[..HEADER_SIZE - 1]).unwrap();

    let result = orch.run(&sealed.output, &mut SecretBytes::from("pw"));

    assert!(matches!(result, Err(Error::MalformedContainer { .. })));
    assert!(!root.exists());
}

/// Seal a hand-built archive the way the encrypt pipeline would.
fn seal_entries(entries: &[ArchiveEntry], password: &str, container: &Path) {
    let archive = write_archive(entries).unwrap();
    let salt = Salt::generate();
    let nonce = Nonce::generate();
    let key = derive_key(password.as_bytes(), &salt, &test_config().derivation).unwrap();
    let ciphertext = seal(&key, &nonce, &archive).unwrap();
    fs::write(container, Container::new(salt, nonce, &ciphertext).serialize()).unwrap();
}

#[test]
fn test_traversal_entry_rejected_before_any_write() {
    let dir = tempdir().unwrap();
    let container = dir.path().join("evil.zip.enc");
    seal_entries(
        &[
            ArchiveEntry::directory("evil", 0o755),
            ArchiveEntry::file("evil/ok.txt", 0o644, b"fine".to_vec()),
            ArchiveEntry::file("evil/../../escaped.txt", 0o644, b"pwned".to_vec()),
        ],
        "pw",
        &container,
    );
    let mut orch = orchestrator();

    let result = orch.run(&container, &mut SecretBytes::from("pw"));

    assert!(matches!(result, Err(Error::PathSecurity(_))));
    assert_eq!(orch.state(), PipelineState::Failed);
    assert!(!dir.path().join("evil").exists());
    assert!(!dir.path().join("escaped.txt").exists());
    assert!(!dir.path().parent().unwrap().join("escaped.txt").exists());
    assert!(no_staging_left(dir.path()));
}

#[test]
fn test_archive_with_two_roots_is_rejected() {
    let dir = tempdir().unwrap();
    let container = dir.path().join("pair.zip.enc");
    seal_entries(
        &[
            ArchiveEntry::file("one/a.txt", 0o644, b"a".to_vec()),
            ArchiveEntry::file("two/b.txt", 0o644, b"b".to_vec()),
        ],
        "pw",
        &container,
    );

    let result = orchestrator().run(&container, &mut SecretBytes::from("pw"));

    assert!(matches!(result, Err(Error::Archive(_))));
    assert!(!dir.path().join("pair").exists());
    assert!(no_staging_left(dir.path()));
}

#[cfg(unix)]
#[test]
fn test_read_only_root_round_trip() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("archive");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"frozen").unwrap();
    set_mode(&root.join("a.txt"), 0o444);
    set_mode(&root, 0o555);
    let before = snapshot(&root);
    let mut orch = orchestrator();

    let sealed = orch.run(&root, &mut SecretBytes::from("pw")).unwrap();
    set_mode(&root, 0o755);
    fs::remove_dir_all(&root).unwrap();

    orch.run(&sealed.output, &mut SecretBytes::from("pw")).unwrap();

    assert_eq!(snapshot(&root), before);
    assert_eq!(mode_of(&root), 0o555);
    assert!(no_staging_left(dir.path()));

    set_mode(&root, 0o755);
}

#[cfg(unix)]
#[test]
fn test_symlinked_input_seals_beside_link() {
    let dir = tempdir().unwrap();
    let elsewhere = tempdir().unwrap();
    let real = three_file_dir(elsewhere.path());
    let link = dir.path().join("photos");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    let before: Vec<Node> = snapshot(&real).into_values().collect();
    let mut orch = orchestrator();

    let sealed = orch.run(&link, &mut SecretBytes::from("pw")).unwrap();

    assert_eq!(
        sealed.output,
        fs::canonicalize(dir.path()).unwrap().join("photos.zip.enc")
    );
    assert!(sealed.output.is_file());
    assert!(!elsewhere.path().join("testdir.zip.enc").exists());

    fs::remove_file(&link).unwrap();
    let opened = orch.run(&sealed.output, &mut SecretBytes::from("pw")).unwrap();

    let restored = dir.path().join("photos");
    assert!(fs::symlink_metadata(&restored).unwrap().is_dir());
    let after: Vec<Node> = snapshot(&restored).into_values().collect();
    assert_eq!(after, before);
    assert_eq!(opened.output.file_name().unwrap(), "photos");
}

#[test]
fn test_empty_password_round_trip() {
    let dir = tempdir().unwrap();
    let root = three_file_dir(dir.path());
    let before = snapshot(&root);
    let mut orch = orchestrator();

    let sealed = orch.run(&root, &mut SecretBytes::from("")).unwrap();
    fs::remove_dir_all(&root).unwrap();

    let wrong = orch.run(&sealed.output, &mut SecretBytes::from("not empty"));
    assert!(matches!(wrong, Err(Error::Authentication)));

    orch.run(&sealed.output, &mut SecretBytes::from("")).unwrap();
    assert_eq!(snapshot(&root), before);
}

fn tree_strategy() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(
        "[a-z]{1,8}(/[a-z]{1,8})?\\.dat",
        prop::collection::vec(any::<u8>(), 0..512),
        1..6,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_round_trip_preserves_tree(
        files in tree_strategy(),
        password in "[ -~]{0,24}",
    ) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir(&root).unwrap();
        for (name, contents) in &files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
        }
        let before = snapshot(&root);
        let mut orch = orchestrator();

        let sealed = orch.run(&root, &mut SecretBytes::from(password.as_str())).unwrap();
        fs::remove_dir_all(&root).unwrap();
        orch.run(&sealed.output, &mut SecretBytes::from(password.as_str())).unwrap();

        prop_assert_eq!(snapshot(&root), before);
    }
}
