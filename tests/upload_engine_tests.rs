//! Engine-level tests driving the uploader and the invocation runner
//! against an in-memory transport, so no network is involved.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use tempfile::TempDir;

use rust_deployer::deploy::{
    run_deploy, upload_collections, CancelToken, DeployRequest, ProgressSink,
};
use rust_deployer::error::DeployError;
use rust_deployer::models::ArtifactCollection;
use rust_deployer::transport::{Credentials, Protocol, TransportOptions, TransportSession};

/// Everything a fake session was asked to do, shared with the test body.
#[derive(Default)]
struct RemoteState {
    dirs: BTreeSet<String>,
    mkdir_order: Vec<String>,
    files: BTreeMap<String, Vec<u8>>,
    opened: Vec<String>,
}

/// In-memory stand-in for a transport session. Completed writes land in
/// `RemoteState::files` on flush, the way a real remote file only holds
/// its full content once the copy ran to completion.
#[derive(Default)]
struct FakeSession {
    state: Rc<RefCell<RemoteState>>,
    fail_mkdir_on: Option<String>,
    fail_open_on: Option<String>,
    /// Trips the token when the named path is opened
    cancel_on_open: Option<(String, CancelToken)>,
}

struct FakeFile {
    state: Rc<RefCell<RemoteState>>,
    path: String,
    buffer: Vec<u8>,
}

impl Write for FakeFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.state
            .borrow_mut()
            .files
            .insert(self.path.clone(), self.buffer.clone());
        Ok(())
    }
}

impl TransportSession for FakeSession {
    fn dir_exists(&mut self, path: &str) -> Result<bool, DeployError> {
        Ok(self.state.borrow().dirs.contains(path))
    }

    fn make_dir(&mut self, path: &str) -> Result<(), DeployError> {
        if self.fail_mkdir_on.as_deref() == Some(path) {
            return Err(DeployError::Protocol(format!(
                "mkdir [{path}] failed: access denied"
            )));
        }
        let mut state = self.state.borrow_mut();
        state.dirs.insert(path.to_string());
        state.mkdir_order.push(path.to_string());
        Ok(())
    }

    fn open_write<'a>(
        &'a mut self,
        path: &str,
    ) -> Result<Box<dyn Write + 'a>, DeployError> {
        if let Some((trigger, token)) = &self.cancel_on_open {
            if trigger == path {
                token.cancel();
            }
        }
        self.state.borrow_mut().opened.push(path.to_string());
        if self.fail_open_on.as_deref() == Some(path) {
            return Err(DeployError::Protocol(format!(
                "failed to open [{path}] for writing"
            )));
        }
        Ok(Box::new(FakeFile {
            state: Rc::clone(&self.state),
            path: path.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn disconnect(&mut self) {}
}

/// Sink collecting everything the engine reports.
#[derive(Default)]
struct RecordingSink {
    messages: RefCell<Vec<String>>,
    warnings: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn message(&self, text: &str) {
        self.messages.borrow_mut().push(text.to_string());
    }

    fn warning(&self, text: &str) {
        self.warnings.borrow_mut().push(text.to_string());
    }

    fn error(&self, text: &str) {
        self.errors.borrow_mut().push(text.to_string());
    }
}

/// Create `count` scratch files named `<label>_<i>.bin` and collect them
/// under the given destination directory.
fn make_collection(
    temp: &TempDir,
    label: &str,
    count: usize,
    destination: &str,
) -> ArtifactCollection {
    let mut collection = ArtifactCollection::new(label);
    for i in 0..count {
        let path = temp.path().join(format!("{label}_{i}.bin"));
        fs::write(&path, format!("{label} payload {i}")).unwrap();
        collection.add_file(path, destination);
    }
    collection
}

fn remote_name(collection: &ArtifactCollection, index: usize) -> String {
    let (source, destination) = &collection.files[index];
    let name = source.file_name().unwrap().to_str().unwrap();
    if destination.is_empty() {
        name.to_string()
    } else {
        format!("{destination}/{name}")
    }
}

#[test]
fn conservation_counts_match_collection_sizes() {
    let temp = TempDir::new().unwrap();
    let collections = vec![
        make_collection(&temp, "first", 3, ""),
        make_collection(&temp, "second", 5, ""),
        make_collection(&temp, "third", 2, ""),
    ];
    let mut session = FakeSession::default();
    let sink = RecordingSink::default();

    let outcome =
        upload_collections(&mut session, &collections, &CancelToken::new(), &sink).unwrap();

    assert!(outcome.success);
    assert!(!outcome.interrupted);
    assert_eq!(
        outcome.uploaded,
        vec![
            ("first".to_string(), 3),
            ("second".to_string(), 5),
            ("third".to_string(), 2),
        ]
    );
    assert_eq!(outcome.total_files(), 10);
    assert_eq!(session.state.borrow().files.len(), 10);
    assert_eq!(
        *sink.messages.borrow(),
        vec![
            "Uploaded [3] files for [first] pattern",
            "Uploaded [5] files for [second] pattern",
            "Uploaded [2] files for [third] pattern",
        ]
    );
}

#[test]
fn uploaded_content_matches_the_source() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "payload", 1, "drop")];
    let mut session = FakeSession::default();

    upload_collections(
        &mut session,
        &collections,
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap();

    let state = session.state.borrow();
    let remote = remote_name(&collections[0], 0);
    assert_eq!(state.files.get(&remote).unwrap(), b"payload payload 0");
}

#[test]
fn ensure_dir_creates_parents_before_children() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "deep", 1, "a/b/c")];
    let mut session = FakeSession::default();

    upload_collections(
        &mut session,
        &collections,
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap();

    let state = session.state.borrow();
    assert_eq!(state.mkdir_order, vec!["a", "a/b", "a/b/c"]);
    assert!(state.files.contains_key(&remote_name(&collections[0], 0)));
}

#[test]
fn ensure_dir_is_a_noop_for_existing_paths() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "existing", 1, "a/b")];
    let mut session = FakeSession::default();
    {
        let mut state = session.state.borrow_mut();
        state.dirs.insert("a".to_string());
        state.dirs.insert("a/b".to_string());
    }

    upload_collections(
        &mut session,
        &collections,
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap();

    assert!(session.state.borrow().mkdir_order.is_empty());
}

#[test]
fn destination_root_needs_no_directory_creation() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "rooted", 2, "")];
    let mut session = FakeSession::default();

    upload_collections(
        &mut session,
        &collections,
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap();

    let state = session.state.borrow();
    assert!(state.mkdir_order.is_empty());
    assert_eq!(state.opened.len(), 2);
}

#[test]
fn interruption_aborts_current_and_subsequent_collections() {
    let temp = TempDir::new().unwrap();
    let first = make_collection(&temp, "first", 5, "");
    let second = make_collection(&temp, "second", 2, "");
    let trigger = remote_name(&first, 1);

    let token = CancelToken::new();
    let mut session = FakeSession {
        cancel_on_open: Some((trigger.clone(), token.clone())),
        ..FakeSession::default()
    };

    let outcome = upload_collections(
        &mut session,
        &[first.clone(), second],
        &token,
        &RecordingSink::default(),
    )
    .unwrap();

    assert!(outcome.interrupted);
    assert!(!outcome.success);
    // file 1 completed before the stop landed while opening file 2
    assert_eq!(outcome.uploaded, vec![("first".to_string(), 1)]);

    let state = session.state.borrow();
    assert_eq!(state.opened, vec![remote_name(&first, 0), trigger]);
    assert!(state
        .opened
        .iter()
        .all(|path| !path.contains("second")));
}

#[test]
fn pre_cancelled_token_uploads_nothing() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "idle", 3, "")];
    let token = CancelToken::new();
    token.cancel();
    let mut session = FakeSession::default();

    let outcome = upload_collections(
        &mut session,
        &collections,
        &token,
        &RecordingSink::default(),
    )
    .unwrap();

    assert!(outcome.interrupted);
    assert!(!outcome.success);
    assert_eq!(outcome.total_files(), 0);
    assert!(session.state.borrow().opened.is_empty());
}

#[test]
fn protocol_error_aborts_before_later_files() {
    let temp = TempDir::new().unwrap();
    let collection = make_collection(&temp, "partial", 3, "");
    let failing = remote_name(&collection, 1);

    let mut session = FakeSession {
        fail_open_on: Some(failing),
        ..FakeSession::default()
    };

    let err = upload_collections(
        &mut session,
        &[collection.clone()],
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::Protocol(_)));
    let state = session.state.borrow();
    // the file transferred before the failure stays on the remote side
    assert!(state.files.contains_key(&remote_name(&collection, 0)));
    assert!(!state.files.contains_key(&remote_name(&collection, 2)));
    assert_eq!(state.opened.len(), 2);
}

#[test]
fn mkdir_failure_surfaces_as_protocol_error() {
    let temp = TempDir::new().unwrap();
    let collections = vec![make_collection(&temp, "denied", 1, "locked/dir")];
    let mut session = FakeSession {
        fail_mkdir_on: Some("locked".to_string()),
        ..FakeSession::default()
    };

    let err = upload_collections(
        &mut session,
        &collections,
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::Protocol(_)));
    assert!(session.state.borrow().opened.is_empty());
}

#[test]
fn missing_local_file_is_an_io_error() {
    let collection = {
        let mut c = ArtifactCollection::new("ghost");
        c.add_file(PathBuf::from("/definitely/not/here.bin"), "");
        c
    };
    let mut session = FakeSession::default();

    let err = upload_collections(
        &mut session,
        &[collection],
        &CancelToken::new(),
        &RecordingSink::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::Io(_)));
}

#[test]
fn run_deploy_rejects_a_blank_target() {
    let request = DeployRequest {
        protocol: Protocol::Smb,
        target: "   ".to_string(),
        credentials: credentials("deployer"),
        options: TransportOptions::default(),
        collections: Vec::new(),
    };
    let sink = RecordingSink::default();

    assert!(!run_deploy(&request, &CancelToken::new(), &sink));
    assert_eq!(sink.errors.borrow().len(), 1);
    assert!(sink.errors.borrow()[0].contains("invalid target address"));
}

#[test]
fn run_deploy_rejects_an_empty_username() {
    let request = DeployRequest {
        protocol: Protocol::Smb,
        target: r"\\fileserver\drop".to_string(),
        credentials: credentials(""),
        options: TransportOptions::default(),
        collections: Vec::new(),
    };
    let sink = RecordingSink::default();

    assert!(!run_deploy(&request, &CancelToken::new(), &sink));
    assert_eq!(sink.errors.borrow().len(), 1);
    assert!(sink.errors.borrow()[0].contains("connection failed"));
    // nothing was started, so nothing was reported as progress
    assert!(sink.messages.borrow().is_empty());
}

#[test]
fn run_deploy_honours_a_pre_set_cancellation() {
    let request = DeployRequest {
        protocol: Protocol::Sftp,
        target: "deploy.example.com/www".to_string(),
        credentials: credentials("deployer"),
        options: TransportOptions::default(),
        collections: Vec::new(),
    };
    let token = CancelToken::new();
    token.cancel();
    let sink = RecordingSink::default();

    assert!(!run_deploy(&request, &token, &sink));
    assert_eq!(*sink.warnings.borrow(), vec!["SFTP upload interrupted."]);
    assert!(sink.messages.borrow().is_empty());
}

fn credentials(username: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: "secret".to_string(),
        domain: None,
    }
}
