//! Integration tests for the Vault client
//!
//! Drives the full client against an in-memory `RemoteStore` for stateful
//! scenarios and against a mock for interaction contracts (exact-path
//! existence matching, transport-failure propagation).

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde_yaml::{Mapping, Value};

use dv_core::{
    CsvOptions, Entry, Error, Format, RemotePath, RemoteStore, Result, SearchMatch,
    StoreCapabilities, Vault, WriteMode,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ==================== In-memory store ====================

/// File map guarded by a mutex; paths are stored normalized.
struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    atomic_move: bool,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            atomic_move: true,
        }
    }

    /// Variant without an atomic move, to exercise the copy+delete fallback
    fn without_atomic_move() -> Self {
        Self {
            atomic_move: false,
            ..Self::new()
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn parent_of(path: &str) -> String {
        match path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(pos) => path[..pos].to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn search(&self, folder: &RemotePath, name: &str) -> Result<Vec<SearchMatch>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .keys()
            .filter(|path| {
                Self::parent_of(path) == folder.as_str()
                    && path.rsplit('/').next().unwrap().eq_ignore_ascii_case(name)
            })
            .map(|path| SearchMatch {
                // The store is case-insensitive; report its folded rendition.
                path: path.to_lowercase(),
                name: path.rsplit('/').next().unwrap().to_string(),
            })
            .collect())
    }

    async fn list_folder(&self, folder: &RemotePath) -> Result<Vec<Entry>> {
        let files = self.files.lock().unwrap();
        // Reverse order on purpose: the client owns the sorting contract.
        Ok(files
            .iter()
            .rev()
            .filter(|(path, _)| Self::parent_of(path) == folder.as_str())
            .map(|(path, content)| {
                Entry::file(path.rsplit('/').next().unwrap(), content.len() as u64)
            })
            .collect())
    }

    async fn download(&self, path: &RemotePath) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn upload(&self, data: Vec<u8>, path: &RemotePath, mode: WriteMode) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        if mode == WriteMode::Add && files.contains_key(path.as_str()) {
            return Err(Error::transport(path, "conflict: path already taken"));
        }
        files.insert(path.as_str().to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &RemotePath) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(path.as_str())
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn copy(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        let content = files
            .get(src.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound(src.to_string()))?;
        files.insert(dest.as_str().to_string(), content);
        Ok(())
    }

    async fn rename(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        let content = files
            .remove(src.as_str())
            .ok_or_else(|| Error::NotFound(src.to_string()))?;
        files.insert(dest.as_str().to_string(), content);
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            atomic_move: self.atomic_move,
            server_copy: true,
        }
    }
}

// ==================== Mock store ====================

mockall::mock! {
    Store {}

    #[async_trait]
    impl RemoteStore for Store {
        async fn search(&self, folder: &RemotePath, name: &str) -> Result<Vec<SearchMatch>>;
        async fn list_folder(&self, folder: &RemotePath) -> Result<Vec<Entry>>;
        async fn download(&self, path: &RemotePath) -> Result<Vec<u8>>;
        async fn upload(&self, data: Vec<u8>, path: &RemotePath, mode: WriteMode) -> Result<()>;
        async fn delete(&self, path: &RemotePath) -> Result<()>;
        async fn copy(&self, src: &RemotePath, dest: &RemotePath) -> Result<()>;
        async fn rename(&self, src: &RemotePath, dest: &RemotePath) -> Result<()>;
        fn capabilities(&self) -> StoreCapabilities;
    }
}

fn sample_frame() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, true),
        Field::new("count", DataType::Int64, true),
        Field::new("score", DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["lisbon", "oslo"])),
            Arc::new(Int64Array::from(vec![3, 14])),
            Arc::new(Float64Array::from(vec![0.5, 2.25])),
        ],
    )
    .unwrap()
}

// ==================== Plain files and normalization ====================

#[tokio::test]
async fn test_text_round_trip_normalizes_path() -> anyhow::Result<()> {
    init_tracing();
    let vault = Vault::new(MemoryStore::new());

    vault.write_file("hello remote", "notes\\drafts\\todo.txt").await?;
    assert!(vault.store().contains("/notes/drafts/todo.txt"));

    let text = vault.read_text("/notes//drafts/todo.txt").await?;
    assert_eq!(text, "hello remote");
    Ok(())
}

#[tokio::test]
async fn test_binary_round_trip() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    let blob = vec![0u8, 255, 17, 3];

    vault.write_file(blob.clone(), "blob.bin").await?;
    assert_eq!(vault.read_bytes("blob.bin").await?, blob);
    Ok(())
}

#[tokio::test]
async fn test_read_text_rejects_invalid_utf8() {
    let vault = Vault::new(MemoryStore::new());
    vault
        .write_file(vec![0xffu8, 0xfe, 0xfd], "junk.txt")
        .await
        .unwrap();

    let err = vault.read_text("junk.txt").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            format: Format::Text,
            ..
        }
    ));
}

#[tokio::test]
async fn test_write_file_add_mode_respects_conflicts() {
    let vault = Vault::new(MemoryStore::new());
    vault.write_file("first", "f.txt").await.unwrap();

    let err = vault
        .write_file_with_mode("second", "f.txt", WriteMode::Add)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));

    // Overwrite remains the default.
    vault.write_file("second", "f.txt").await.unwrap();
    assert_eq!(vault.read_text("f.txt").await.unwrap(), "second");
}

#[tokio::test]
async fn test_invalid_path_fails_before_any_remote_call() {
    let vault = Vault::new(MockStore::new());
    let err = vault.read_bytes("a/../b").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}

// ==================== Existence ====================

#[tokio::test]
async fn test_exists_requires_exact_path_not_just_name() {
    init_tracing();
    let mut store = MockStore::new();
    // The store reports a same-named file from a sibling folder.
    store
        .expect_search()
        .withf(|folder, name| folder.as_str() == "/reports" && name == "data.csv")
        .returning(|_, _| {
            Ok(vec![SearchMatch {
                path: "/archive/data.csv".to_string(),
                name: "data.csv".to_string(),
            }])
        });

    let vault = Vault::new(store);
    assert!(!vault.exists("/reports/data.csv").await.unwrap());
}

#[tokio::test]
async fn test_exists_matches_case_insensitively() {
    let mut store = MockStore::new();
    store.expect_search().returning(|_, _| {
        Ok(vec![SearchMatch {
            path: "/reports/data.csv".to_string(),
            name: "data.csv".to_string(),
        }])
    });

    let vault = Vault::new(store);
    assert!(vault.exists("/Reports/Data.CSV").await.unwrap());
}

#[tokio::test]
async fn test_exists_false_on_empty_results() {
    let mut store = MockStore::new();
    store.expect_search().returning(|_, _| Ok(vec![]));

    let vault = Vault::new(store);
    assert!(!vault.exists("/nowhere/nothing.txt").await.unwrap());
}

#[tokio::test]
async fn test_exists_top_level_searches_root() {
    let mut store = MockStore::new();
    store
        .expect_search()
        .withf(|folder, name| folder.is_root() && name == "top.txt")
        .returning(|_, _| {
            Ok(vec![SearchMatch {
                path: "/top.txt".to_string(),
                name: "top.txt".to_string(),
            }])
        });

    let vault = Vault::new(store);
    assert!(vault.exists("top.txt").await.unwrap());
}

#[tokio::test]
async fn test_root_exists_without_remote_call() {
    // No expectations set: any store call would panic the mock.
    let vault = Vault::new(MockStore::new());
    assert!(vault.exists("/").await.unwrap());
}

// ==================== Transport failures ====================

#[tokio::test]
async fn test_transport_failure_surfaces_before_decode() {
    let mut store = MockStore::new();
    store
        .expect_download()
        .returning(|path| Err(Error::transport(path, "HTTP 503")));

    let vault = Vault::new(store);
    let err = vault.read_yaml("conf.yml").await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}

// ==================== Lifecycle ====================

#[tokio::test]
async fn test_ls_sorts_regardless_of_remote_order() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
        vault.write_file("x", &format!("/box/{name}")).await?;
    }

    // MemoryStore lists in reverse order; ls must still sort ascending.
    assert_eq!(vault.ls("/box").await?, ["alpha.txt", "mid.txt", "zeta.txt"]);
    Ok(())
}

#[tokio::test]
async fn test_entries_carry_sizes() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    vault.write_file("abcde", "/box/a.txt").await?;

    let entries = vault.entries("/box").await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].size, Some(5));
    assert!(!entries[0].is_folder);
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let vault = Vault::new(MemoryStore::new());
    let err = vault.delete("ghost.txt").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_mv_overwrites_existing_destination() -> anyhow::Result<()> {
    init_tracing();
    let vault = Vault::new(MemoryStore::new());
    vault.write_file("new content", "src.txt").await?;
    vault.write_file("old content", "dest.txt").await?;

    vault.mv("src.txt", "dest.txt", true).await?;

    assert!(!vault.exists("src.txt").await?);
    assert!(vault.exists("dest.txt").await?);
    assert_eq!(vault.read_text("dest.txt").await?, "new content");
    Ok(())
}

#[tokio::test]
async fn test_mv_falls_back_to_copy_and_delete() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::without_atomic_move());
    vault.write_file("payload", "a/src.bin").await?;

    vault.mv("a/src.bin", "b/dest.bin", true).await?;

    assert!(!vault.exists("/a/src.bin").await?);
    assert_eq!(vault.read_text("/b/dest.bin").await?, "payload");
    Ok(())
}

#[tokio::test]
async fn test_mv_missing_source_propagates_not_found() {
    let vault = Vault::new(MemoryStore::new());
    let err = vault.mv("ghost.txt", "dest.txt", true).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ==================== Typed formats ====================

#[tokio::test]
async fn test_yaml_round_trip_preserves_key_order() -> anyhow::Result<()> {
    init_tracing();
    let vault = Vault::new(MemoryStore::new());

    let mut mapping = Mapping::new();
    mapping.insert(Value::from("a"), Value::from(1));
    mapping.insert(Value::from("b"), Value::from(2));

    // No leading slash on purpose: the document must land at /notes.yml.
    vault.write_yaml(&mapping, "notes.yml").await?;
    assert!(vault.store().contains("/notes.yml"));

    let restored = vault.read_yaml("/notes.yml").await?;
    assert_eq!(restored, mapping);
    let keys: Vec<_> = restored
        .keys()
        .map(|k| k.as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, ["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn test_yaml_malformed_payload_is_decode_error() {
    let vault = Vault::new(MemoryStore::new());
    vault.write_file(": : :", "broken.yml").await.unwrap();

    let err = vault.read_yaml("broken.yml").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            format: Format::Yaml,
            ..
        }
    ));
}

#[tokio::test]
async fn test_csv_round_trip() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    let frame = sample_frame();
    let options = CsvOptions::default();

    vault.write_csv(&frame, "data.csv", &options).await?;
    let restored = vault.read_csv("data.csv", &options).await?;

    assert_eq!(restored, frame);
    Ok(())
}

#[tokio::test]
async fn test_parquet_round_trip() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    let frame = sample_frame();

    vault.write_parquet(&frame, "data.parquet").await?;
    let restored = vault.read_parquet("data.parquet").await?;

    assert_eq!(restored, frame);
    Ok(())
}

#[tokio::test]
async fn test_excel_round_trip_single_sheet() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());

    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let frame = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["ada", "grace"])),
            Arc::new(Float64Array::from(vec![9.5, 7.25])),
        ],
    )?;

    vault.write_excel(&frame, "scores.xlsx", Some("scores")).await?;
    let restored = vault.read_excel("scores.xlsx").await?;

    assert_eq!(restored, frame);
    Ok(())
}

#[tokio::test]
async fn test_excel_named_sheets_read() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());

    // Multi-sheet workbooks cannot be produced by write_excel (one sheet per
    // call), so build one directly and store it as a plain file.
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (name, value) in [("alpha", 1.0), ("beta", 2.0)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        sheet.write_string(0, 0, "v")?;
        sheet.write_number(1, 0, value)?;
    }
    let bytes = workbook.save_to_buffer()?;
    vault.write_file(bytes, "book.xlsx").await?;

    let frames = vault.read_excel_sheets("book.xlsx", &["beta", "alpha"]).await?;
    let keys: Vec<_> = frames.keys().cloned().collect();
    assert_eq!(keys, ["beta", "alpha"]);
    assert_eq!(frames["beta"].num_rows(), 1);
    Ok(())
}

#[tokio::test]
async fn test_parquet_garbage_is_decode_error() {
    let vault = Vault::new(MemoryStore::new());
    vault.write_file("not parquet", "fake.parquet").await.unwrap();

    let err = vault.read_parquet("fake.parquet").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            format: Format::Parquet,
            ..
        }
    ));
}

// ==================== ZIP ====================

fn zip_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in members {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_read_zip_defaults_to_first_physical_entry() -> anyhow::Result<()> {
    let vault = Vault::new(MemoryStore::new());
    let archive = zip_archive(&[("b.txt", b"bee"), ("a.txt", b"ay")]);
    vault.write_file(archive, "archive.zip").await?;

    // First entry in the archive's own order, not alphabetical.
    assert_eq!(vault.read_zip("archive.zip", None).await?, b"bee");
    assert_eq!(vault.read_zip("archive.zip", Some("a.txt")).await?, b"ay");
    Ok(())
}

#[tokio::test]
async fn test_read_zip_missing_member_is_not_found() {
    let vault = Vault::new(MemoryStore::new());
    let archive = zip_archive(&[("a.txt", b"ay")]);
    vault.write_file(archive, "archive.zip").await.unwrap();

    let err = vault
        .read_zip("archive.zip", Some("ghost.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
