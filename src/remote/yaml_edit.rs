//! Checked navigation into parsed YAML documents

use std::fmt;

use serde_yaml::Value;

use crate::remote::error::EditError;

/// Path of keys from the document root to a scalar field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Split a dotted path such as `spec.source.targetRevision`
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Build a path from keys that may themselves contain dots
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One field assignment applied to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub path: FieldPath,
    pub value: String,
    /// Optional edits are skipped when their parent mapping is absent
    pub required: bool,
}

impl FieldEdit {
    pub fn required(path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            path,
            value: value.into(),
            required: true,
        }
    }

    pub fn optional(path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            path,
            value: value.into(),
            required: false,
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn joined(segments: &[String]) -> String {
    if segments.is_empty() {
        "<root>".to_string()
    } else {
        segments.join(".")
    }
}

/// Walk `segments` from `root`, requiring a mapping at every step.
fn mapping_at<'a>(
    root: &'a mut Value,
    segments: &[String],
) -> Result<&'a mut serde_yaml::Mapping, EditError> {
    let mut current = root;
    for (depth, key) in segments.iter().enumerate() {
        let mapping = match current {
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(EditError::TypeMismatch {
                    path: joined(&segments[..depth]),
                    found: kind(other),
                });
            }
        };
        current = mapping
            .get_mut(key.as_str())
            .ok_or_else(|| EditError::FieldNotFound(segments[..=depth].join(".")))?;
    }

    match current {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(EditError::TypeMismatch {
            path: joined(segments),
            found: kind(other),
        }),
    }
}

/// Apply `edit` to `document`.
///
/// Returns `Ok(false)` when an optional edit was skipped because its parent is missing.
pub fn apply_edit(document: &mut Value, edit: &FieldEdit) -> Result<bool, EditError> {
    let Some((field, parents)) = edit.path.segments().split_last() else {
        return Err(EditError::FieldNotFound(String::new()));
    };

    let parent = match mapping_at(document, parents) {
        Ok(parent) => parent,
        Err(EditError::FieldNotFound(_) | EditError::TypeMismatch { .. }) if !edit.required => {
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    parent.insert(
        Value::String(field.clone()),
        Value::String(edit.value.clone()),
    );
    Ok(true)
}

/// Parse `content`, apply every edit in order, and serialize the result.
pub fn edit_document(content: &str, edits: &[FieldEdit]) -> Result<String, EditError> {
    let mut document: Value = serde_yaml::from_str(content)?;
    for edit in edits {
        apply_edit(&mut document, edit)?;
    }
    Ok(serde_yaml::to_string(&document)?)
}
