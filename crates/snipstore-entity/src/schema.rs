//! Schema validation for untyped snippet and folder payloads.
//!
//! Every check runs before anything reaches storage and reports *all*
//! violated fields at once. Structural checks (presence, JSON types,
//! literals, enums) walk the JSON here; value constraints (lengths) come
//! from the `validator` derives on [`NewSnippet`] and [`NewFolder`].

use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use snipstore_core::error::{AppError, AppResult, FieldViolation};

use crate::folder::NewFolder;
use crate::snippet::{
    NewSnippet, OwnerSnapshot, SchemaVersion, Snippet, SnippetContent, SnippetType, Visibility,
};

/// Project assigned when a payload names none.
pub const DEFAULT_PROJECT_ID: i64 = 1;

/// Record name reserved for the folder document in the filesystem store.
pub const RESERVED_FOLDERS_KEY: &str = "folders";

/// Keys the server always assigns itself; dropped from partial updates.
const SERVER_STAMPED: [&str; 4] = ["inserted_at", "updated_at", "owner", "updated_by"];

/// Validate a snippet payload and apply defaults.
///
/// `inserted_at`/`updated_at` are type-checked when present but otherwise
/// ignored; they are stamped on write.
pub fn validate_snippet(payload: &Value) -> AppResult<NewSnippet> {
    let obj = expect_object(payload)?;
    let mut v = Violations::default();

    let id = v.required_str(obj, "id", "id");
    if let Some(id) = &id {
        if let Err(msg) = check_record_key(id) {
            v.push("id", msg);
        }
    }
    v.optional_str(obj, "inserted_at", "inserted_at");
    v.optional_str(obj, "updated_at", "updated_at");

    let snippet_type = match obj.get("type") {
        Some(Value::String(s)) if s == "sql" => Some(SnippetType::Sql),
        Some(_) => {
            v.push("type", "must be \"sql\"");
            None
        }
        None => {
            v.missing("type");
            None
        }
    };

    let name = v.required_str(obj, "name", "name");
    let description = v.optional_str(obj, "description", "description");

    let content = match obj.get("content") {
        Some(Value::Object(c)) => validate_content(c, &mut v),
        Some(_) => {
            v.push("content", "expected an object");
            None
        }
        None => {
            v.missing("content");
            None
        }
    };

    let visibility = match obj.get("visibility") {
        Some(Value::String(s)) => match s.parse::<Visibility>() {
            Ok(vis) => Some(vis),
            Err(_) => {
                v.push("visibility", "must be one of user, project, org, public");
                None
            }
        },
        Some(_) => {
            v.push("visibility", "expected a string");
            None
        }
        None => {
            v.missing("visibility");
            None
        }
    };

    let project_id = v
        .optional_int(obj, "project_id", "project_id")
        .unwrap_or(DEFAULT_PROJECT_ID);
    let folder_id = v.optional_str(obj, "folder_id", "folder_id");
    let owner_id = v.required_int(obj, "owner_id", "owner_id");
    let owner = v.optional_snapshot(obj, "owner");
    let updated_by = v.optional_snapshot(obj, "updated_by");

    let (Some(id), Some(snippet_type), Some(name), Some(content), Some(visibility), Some(owner_id)) =
        (id, snippet_type, name, content, visibility, owner_id)
    else {
        return Err(v.into_error());
    };

    let snippet = NewSnippet {
        id,
        snippet_type,
        name,
        description,
        content,
        visibility,
        project_id,
        folder_id,
        owner_id,
        owner: owner.unwrap_or_default(),
        updated_by: updated_by.unwrap_or_default(),
    };

    if let Err(errors) = snippet.validate() {
        v.extend_from(&errors);
    }
    v.finish(snippet)
}

/// Validate a folder creation payload. Any client-supplied `id` is ignored.
pub fn validate_new_folder(payload: &Value) -> AppResult<NewFolder> {
    let obj = expect_object(payload)?;
    let mut v = Violations::default();

    let name = v.required_str(obj, "name", "name");
    let owner_id = v.required_int(obj, "owner_id", "owner_id");
    let parent_id = v.optional_str(obj, "parent_id", "parent_id");
    let project_id = v
        .optional_int(obj, "project_id", "project_id")
        .unwrap_or(DEFAULT_PROJECT_ID);

    let (Some(name), Some(owner_id)) = (name, owner_id) else {
        return Err(v.into_error());
    };

    let folder = NewFolder {
        name,
        owner_id,
        parent_id,
        project_id,
    };

    if let Err(errors) = folder.validate() {
        v.extend_from(&errors);
    }
    v.finish(folder)
}

/// Check that a patch is an object and strip server-stamped keys.
pub fn validate_patch(payload: &Value) -> AppResult<Map<String, Value>> {
    let mut patch = expect_object(payload)?.clone();
    for key in SERVER_STAMPED {
        patch.remove(key);
    }
    Ok(patch)
}

/// Shallow-merge `patch` over the JSON form of `existing`.
///
/// The id is immutable: a patch naming a different id is rejected.
pub fn merge_patch(existing: &Snippet, patch: &Map<String, Value>) -> AppResult<Value> {
    if let Some(id) = patch.get("id") {
        if id.as_str() != Some(existing.id.as_str()) {
            return Err(AppError::invalid_fields(vec![FieldViolation::new(
                "id",
                format!("cannot change the id of snippet {}", existing.id),
            )]));
        }
    }

    let mut merged = match serde_json::to_value(existing)? {
        Value::Object(map) => map,
        _ => return Err(AppError::internal("Snippet did not serialize to an object")),
    };
    for (key, value) in patch {
        if key != "id" {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

/// Check that `key` is usable as a record key (and therefore a file name).
///
/// Accepts 1-128 characters from `[A-Za-z0-9_.-]`, not starting with `.`,
/// and not the reserved folder document name.
pub fn check_record_key(key: &str) -> Result<(), String> {
    if key.is_empty() || key.len() > 128 {
        return Err("must be between 1 and 128 characters".into());
    }
    if key.starts_with('.') {
        return Err("must not start with '.'".into());
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("may only contain letters, digits, '-', '_' and '.'".into());
    }
    if key == RESERVED_FOLDERS_KEY {
        return Err(format!("'{RESERVED_FOLDERS_KEY}' is reserved"));
    }
    Ok(())
}

fn validate_content(obj: &Map<String, Value>, v: &mut Violations) -> Option<SnippetContent> {
    let sql = v.required_str(obj, "sql", "content.sql");
    let favorite = match obj.get("favorite") {
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            v.push("content.favorite", "expected a boolean");
            None
        }
        None => {
            v.missing("content.favorite");
            None
        }
    };
    let content_id = v.required_str(obj, "content_id", "content.content_id");
    let schema_version = match obj.get("schema_version") {
        Some(Value::String(s)) if s == SchemaVersion::V1.as_str() => Some(SchemaVersion::V1),
        Some(_) => {
            v.push("content.schema_version", "must be \"1.0\"");
            None
        }
        None => {
            v.missing("content.schema_version");
            None
        }
    };

    Some(SnippetContent {
        sql: sql?,
        favorite: favorite?,
        content_id: content_id?,
        schema_version: schema_version?,
    })
}

fn expect_object(payload: &Value) -> AppResult<&Map<String, Value>> {
    payload.as_object().ok_or_else(|| {
        AppError::invalid_fields(vec![FieldViolation::new("$", "expected a JSON object")])
    })
}

/// Accumulates violations while walking a payload.
#[derive(Debug, Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn missing(&mut self, field: &str) {
        self.push(field, "is required");
    }

    fn required_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(path, "expected a string");
                None
            }
            None => {
                self.missing(path);
                None
            }
        }
    }

    /// Absent and `null` both read as `None`.
    fn optional_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                self.push(path, "expected a string or null");
                None
            }
        }
    }

    fn required_int(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<i64> {
        match obj.get(key) {
            Some(value) => self.int(value, path),
            None => {
                self.missing(path);
                None
            }
        }
    }

    fn optional_int(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<i64> {
        match obj.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => self.int(value, path),
        }
    }

    fn int(&mut self, value: &Value, path: &str) -> Option<i64> {
        match value.as_i64() {
            Some(i) => Some(i),
            None => {
                self.push(path, "expected an integer");
                None
            }
        }
    }

    fn optional_snapshot(&mut self, obj: &Map<String, Value>, key: &str) -> Option<OwnerSnapshot> {
        match obj.get(key) {
            Some(Value::Null) | None => None,
            Some(Value::Object(snap)) => {
                let id = self.required_int(snap, "id", &format!("{key}.id"));
                let username = self.required_str(snap, "username", &format!("{key}.username"));
                Some(OwnerSnapshot {
                    id: id?,
                    username: username?,
                })
            }
            Some(_) => {
                self.push(key, "expected an object");
                None
            }
        }
    }

    fn extend_from(&mut self, errors: &ValidationErrors) {
        let mut found: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| describe_code(&e.code));
                    FieldViolation::new(field.to_string(), message)
                })
            })
            .collect();
        found.sort_by(|a, b| a.field.cmp(&b.field));
        self.0.extend(found);
    }

    fn into_error(self) -> AppError {
        AppError::invalid_fields(self.0)
    }

    fn finish<T>(self, value: T) -> AppResult<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.into_error())
        }
    }
}

fn describe_code(code: &str) -> String {
    match code {
        "length" => "has an invalid length".to_string(),
        other => format!("failed the '{other}' check"),
    }
}
