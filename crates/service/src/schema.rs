//! Schema file loading and periodic refresh.
//!
//! Every `*.yaml`, `*.yml` or `*.json` file in the schemas directory holds
//! one [`RecordSchema`]. The schema is registered under the file stem, so
//! `person.yaml` is selected by `X-Schema-Name: person`.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use fieldseal::{FieldResolver, RecordSchema, SchemaRegistry};
use tokio::time;
use tracing::{debug, info, warn};

const SCHEMA_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Read every schema file in `dir` and atomically replace the registry.
///
/// Each schema is resolved with `resolver` before anything is registered, so
/// a schema whose fields lack a usable name tag never reaches a request.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or any schema file
/// cannot be read, parsed or resolved. The registry is left untouched.
pub async fn load_all(dir: &Path, resolver: &FieldResolver, registry: &SchemaRegistry) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to list schema directory {}", dir.display()))?;

    let mut schemas: HashMap<String, RecordSchema> = HashMap::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to read schema directory {}", dir.display()))?
    {
        let path = entry.path();
        let Some(name) = schema_name_from_path(&path) else {
            debug!(path = %path.display(), "skipping non-schema file");
            continue;
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read schema file {}", path.display()))?;

        let mut schema = RecordSchema::from_document(&text)
            .with_context(|| format!("failed to parse schema file {}", path.display()))?;

        resolver
            .describe_all(&schema.fields)
            .with_context(|| format!("schema {name} has unusable field tags"))?;

        if schema.name != name {
            warn!(
                schema = %name,
                declared = %schema.name,
                "schema name differs from file name; using file name"
            );
            schema.name = name.clone();
        }

        info!(schema = %name, fields = schema.fields.len(), "loaded schema");
        schemas.insert(name, schema);
    }

    if schemas.is_empty() {
        warn!(dir = %dir.display(), "no schema files found");
    }

    let count = schemas.len();
    registry.replace_all(schemas);
    info!(count, "schema registry refreshed");
    Ok(count)
}

/// Spawn a background task that periodically reloads the schema directory.
///
/// On refresh failure the previous registry contents are retained and a
/// warning is emitted; the service continues to operate with stale schemas.
pub fn refresh_task(
    dir: PathBuf,
    interval: Duration,
    resolver: FieldResolver,
    registry: SchemaRegistry,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // The first tick completes immediately; startup has already loaded.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = load_all(&dir, &resolver, &registry).await {
                warn!(error = %e, "schema refresh failed; retaining previous registry");
            }
        }
    })
}

/// Schema name for a file path: the stem of a `.yaml`, `.yml` or `.json` file.
fn schema_name_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !SCHEMA_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (!stem.is_empty()).then(|| stem.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON_YAML: &str = r#"
name: person
fields:
  - name: name
    type: string
    tags: 'bson:"Name" encrypted:"false"'
  - name: score
    type: float64
    tags: { bson: Score }
"#;

    const ORDER_JSON: &str = r#"{
  "name": "order",
  "fields": [
    {"name": "id", "type": "uint64", "tags": {"bson": "Id", "encrypted": "false"}},
    {"name": "card", "type": "string", "tags": "ename:\"Card\""}
  ]
}"#;

    #[test]
    fn schema_name_strips_extension() {
        assert_eq!(schema_name_from_path(Path::new("/s/payments-v1.yaml")).as_deref(), Some("payments-v1"));
        assert_eq!(schema_name_from_path(Path::new("/s/users.json")).as_deref(), Some("users"));
        assert_eq!(schema_name_from_path(Path::new("orders.yml")).as_deref(), Some("orders"));
    }

    #[test]
    fn schema_name_ignores_other_files() {
        assert_eq!(schema_name_from_path(Path::new("/s/README.md")), None);
        assert_eq!(schema_name_from_path(Path::new("/s/bare")), None);
    }

    #[tokio::test]
    async fn loads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("person.yaml"), PERSON_YAML).unwrap();
        std::fs::write(dir.path().join("order.json"), ORDER_JSON).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let registry = SchemaRegistry::new();
        let count = load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.names(), vec!["order".to_owned(), "person".to_owned()]);
        assert_eq!(registry.get("order").unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn file_stem_wins_over_declared_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("people-v2.yaml"), PERSON_YAML).unwrap();

        let registry = SchemaRegistry::new();
        load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .unwrap();
        assert_eq!(registry.get("people-v2").unwrap().name, "people-v2");
        assert!(registry.get("person").is_err());
    }

    #[tokio::test]
    async fn bad_file_keeps_previous_registry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("person.yaml"), PERSON_YAML).unwrap();
        let registry = SchemaRegistry::new();
        load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .unwrap();

        std::fs::write(dir.path().join("broken.yaml"), "fields: [").unwrap();
        assert!(load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .is_err());
        assert_eq!(registry.names(), vec!["person".to_owned()]);
    }

    #[tokio::test]
    async fn unnamed_field_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("anon.yaml"),
            "name: anon\nfields:\n  - name: x\n    type: string\n    tags: {}\n",
        )
        .unwrap();
        let registry = SchemaRegistry::new();
        let err = load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("anon"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let registry = SchemaRegistry::new();
        let missing = Path::new("/definitely/not/a/schemas/dir");
        assert!(load_all(missing, &FieldResolver::default(), &registry)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn refresh_task_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("person.yaml"), PERSON_YAML).unwrap();
        let registry = SchemaRegistry::new();
        load_all(dir.path(), &FieldResolver::default(), &registry)
            .await
            .unwrap();

        let handle = refresh_task(
            dir.path().to_path_buf(),
            Duration::from_millis(20),
            FieldResolver::default(),
            registry.clone(),
        );
        std::fs::write(dir.path().join("order.json"), ORDER_JSON).unwrap();

        for _ in 0..50 {
            if registry.len() == 2 {
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert_eq!(registry.len(), 2);
    }
}
