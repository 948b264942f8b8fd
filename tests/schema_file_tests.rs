//! Schema file reconciliation tests
//!
//! Diagnostics are captured with a scoped `tracing` subscriber writing plain
//! message lines into a shared buffer.

use std::io::Write;
use std::sync::{Arc, Mutex};

use forest_schema::collection::SmartField;
use forest_schema::schema_file::{MSG_FILE_MISSING, MSG_INVALID_JSON, MSG_NOT_SYNCHRONIZED};
use forest_schema::{
    CollectionDefinition, ForestConfig, ForestContext, ModelIntrospector, ScalarType, SchemaFile,
    StaticModels,
};
use tempfile::{tempdir, TempDir};
use tracing::Level;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn messages(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Run `f` with WARN-level events captured
fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::WARN)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.messages())
}

struct QuestionForest;

impl CollectionDefinition for QuestionForest {
    fn name(&self) -> &str {
        "Question"
    }

    fn fields(&self) -> Vec<SmartField> {
        vec![SmartField::new("foo", ScalarType::String).with_getter(|_| serde_json::json!("foo"))]
    }
}

fn context(dir: &TempDir, debug: bool) -> ForestContext {
    let config = ForestConfig {
        debug,
        schema_path: dir.path().join(".forestadmin-schema.json"),
        ..ForestConfig::default()
    };
    let host = StaticModels::from_json(include_str!("fixtures/models.json")).unwrap();
    let mut context = ForestContext::new(config);
    let models = host.models();
    let question = models.iter().find(|m| m.name == "Question").unwrap();
    context.collections().register(&QuestionForest, Some(question));
    context.build_schema(&host).unwrap();
    context
}

fn schema_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join(".forestadmin-schema.json")
}

#[test]
fn test_handle_schema_file_no_file() {
    let dir = tempdir().unwrap();
    let mut context = context(&dir, false);

    let (result, messages) = capture_warnings(|| context.handle_schema_file().map(|d| d.is_some()));

    assert!(!result.unwrap());
    assert!(context.schema_data().is_none());
    assert_eq!(messages, vec![MSG_FILE_MISSING, MSG_NOT_SYNCHRONIZED]);
    assert_eq!(
        messages,
        vec![
            "The .forestadmin-schema.json file does not exist.",
            "The schema cannot be synchronized with Forest Admin servers.",
        ]
    );
}

#[test]
fn test_handle_schema_file_invalid_json_production() {
    let dir = tempdir().unwrap();
    std::fs::write(schema_path(&dir), "invalid").unwrap();
    let mut context = context(&dir, false);

    let (result, messages) = capture_warnings(|| context.handle_schema_file().map(|d| d.is_some()));

    assert!(!result.unwrap());
    assert!(context.schema_data().is_none());
    assert_eq!(
        messages,
        vec![
            "The content of .forestadmin-schema.json file is not a correct JSON.",
            "The schema cannot be synchronized with Forest Admin servers.",
        ]
    );
    assert_eq!(messages[0], MSG_INVALID_JSON);
}

#[test]
fn test_handle_schema_file_production() {
    let dir = tempdir().unwrap();
    let mut context = context(&dir, false);
    let built = context.schema().unwrap().clone();
    SchemaFile::new(schema_path(&dir)).persist(&built).unwrap();

    let (result, messages) = capture_warnings(|| context.handle_schema_file().map(|d| d.cloned()));

    assert_eq!(result.unwrap(), Some(built));
    assert!(context.schema_data().is_some());
    assert!(messages.is_empty());
}

#[test]
fn test_handle_schema_file_production_reports_drift() {
    let dir = tempdir().unwrap();
    let mut context = context(&dir, false);
    let mut stale = context.schema().unwrap().clone();
    stale.collections.truncate(1);
    SchemaFile::new(schema_path(&dir)).persist(&stale).unwrap();

    let (_, messages) = capture_warnings(|| context.handle_schema_file().unwrap().cloned());

    assert_eq!(context.schema_data(), Some(&stale));
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("schema file differs from the models"));
}

#[test]
fn test_handle_schema_file_debug() {
    let dir = tempdir().unwrap();
    std::fs::write(schema_path(&dir), "outdated").unwrap();
    let mut context = context(&dir, true);

    context.handle_schema_file().unwrap();
    assert!(context.schema_data().is_some());

    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(schema_path(&dir)).unwrap()).unwrap();
    let question = data["collections"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Question")
        .unwrap();
    let fields = question["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 6);

    let foo = fields.iter().find(|f| f["field"] == "foo").unwrap();
    assert!(foo.get("get").is_none());
    assert_eq!(foo["is_virtual"], true);
}

#[test]
fn test_persist_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let mut debug = context(&dir, true);
    debug.handle_schema_file().unwrap();
    let written = debug.schema().unwrap().clone();

    let mut production = context(&dir, false);
    production.handle_schema_file().unwrap();
    assert_eq!(production.schema_data(), Some(&written));

    let loaded = SchemaFile::new(schema_path(&dir)).load_and_validate().unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.checksum().unwrap(), written.checksum().unwrap());
}

#[test]
fn test_handle_schema_file_without_build_is_noop() {
    let dir = tempdir().unwrap();
    let config = ForestConfig {
        debug: true,
        schema_path: schema_path(&dir),
        ..ForestConfig::default()
    };
    let mut context = ForestContext::new(config);
    assert!(context.handle_schema_file().unwrap().is_none());
    assert!(!schema_path(&dir).exists());
}

#[test]
fn test_handle_schema_file_wrong_shape_production() {
    let dir = tempdir().unwrap();
    std::fs::write(schema_path(&dir), r#"{"foo": 1}"#).unwrap();
    let mut context = context(&dir, false);

    let (result, messages) = capture_warnings(|| context.handle_schema_file().map(|d| d.is_some()));

    assert!(!result.unwrap());
    assert_eq!(messages, vec![MSG_INVALID_JSON, MSG_NOT_SYNCHRONIZED]);
}

#[test]
fn test_handle_schema_file_unreadable_production() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(schema_path(&dir)).unwrap();
    let mut context = context(&dir, false);

    let (result, messages) = capture_warnings(|| context.handle_schema_file().map(|d| d.is_some()));

    assert!(!result.unwrap());
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("cannot read schema file"));
    assert_ne!(messages[0], MSG_INVALID_JSON);
    assert_eq!(messages[1], MSG_NOT_SYNCHRONIZED);
}

#[test]
fn test_handle_schema_file_retries_from_scratch() {
    let dir = tempdir().unwrap();
    let mut context = context(&dir, false);
    let built = context.schema().unwrap().clone();
    SchemaFile::new(schema_path(&dir)).persist(&built).unwrap();

    context.handle_schema_file().unwrap();
    assert_eq!(context.schema_data(), Some(&built));

    std::fs::remove_file(schema_path(&dir)).unwrap();
    assert!(context.handle_schema_file().unwrap().is_none());
    assert!(context.schema_data().is_none());
}
