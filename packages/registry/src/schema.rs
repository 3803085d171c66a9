//! # Block Schemas
//!
//! Declarative description of a design's editable fields. A single generic form
//! renderer walks the sections and edits the block through dotted paths, so no
//! design needs bespoke editor code.
//!
//! ```text
//! SchemaDescriptor
//!  └─ Section "Content"
//!      ├─ title        Text
//!      ├─ columns      Slider(1, 6, 1)
//!      └─ images       List ─┬─ src      Text
//!                            └─ caption  Text
//! ```
//!
//! Repeated lists nest one level deep only.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sitecraft_model::{
    insert_list_item, move_list_item, remove_list_item, Block, ListMove, PathError,
};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Repeated list '{0}' is nested inside another list")]
    NestedList(String),

    #[error("Slider '{0}' has an invalid range")]
    InvalidSlider(String),

    #[error("Field path '{0}' is declared twice")]
    DuplicatePath(String),

    #[error("Value for '{path}' must be {expected}")]
    Rejected { path: String, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    MultilineText,
    Number,
    Boolean,
    Select {
        options: Vec<SelectOption>,
    },
    /// `fallback_token` names the theme token shown while the field is unset
    Color {
        #[serde(rename = "fallbackToken", skip_serializing_if = "Option::is_none")]
        fallback_token: Option<String>,
    },
    Slider {
        min: f64,
        max: f64,
        step: f64,
    },
    List {
        #[serde(rename = "itemLabel")]
        item_label: String,
        fields: Vec<SchemaField>,
        /// Record appended by "add item"
        #[serde(rename = "newItem")]
        new_item: Value,
    },
}

impl FieldKind {
    /// Human-readable expectation, used in rejection messages
    pub fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::MultilineText => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Select { .. } => "one of the listed options",
            FieldKind::Color { .. } => "a color string or null",
            FieldKind::Slider { .. } => "a number on a slider step within its range",
            FieldKind::List { .. } => "a list",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text | FieldKind::MultilineText => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Select { options } => value
                .as_str()
                .is_some_and(|v| options.iter().any(|o| o.value == v)),
            FieldKind::Color { .. } => value.is_string() || value.is_null(),
            FieldKind::Slider { min, max, step } => value
                .as_f64()
                .is_some_and(|v| v >= *min && v <= *max && on_step(v, *min, *step)),
            FieldKind::List { .. } => value.is_array(),
        }
    }
}

/// Whether `value` lands on a slider notch counted from `min`
fn on_step(value: f64, min: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let steps = (value - min) / step;
    (steps - steps.round()).abs() < 1e-6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Dotted path into the block record (relative to the list item for list sub-fields)
    pub path: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl SchemaField {
    pub fn new(path: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn text(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(path, label, FieldKind::Text)
    }

    pub fn multiline(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(path, label, FieldKind::MultilineText)
    }

    pub fn number(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(path, label, FieldKind::Number)
    }

    pub fn boolean(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(path, label, FieldKind::Boolean)
    }

    pub fn select(
        path: impl Into<String>,
        label: impl Into<String>,
        options: &[(&str, &str)],
    ) -> Self {
        let options = options
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        Self::new(path, label, FieldKind::Select { options })
    }

    pub fn color(
        path: impl Into<String>,
        label: impl Into<String>,
        fallback_token: Option<&str>,
    ) -> Self {
        Self::new(
            path,
            label,
            FieldKind::Color {
                fallback_token: fallback_token.map(str::to_string),
            },
        )
    }

    pub fn slider(
        path: impl Into<String>,
        label: impl Into<String>,
        min: f64,
        max: f64,
        step: f64,
    ) -> Self {
        Self::new(path, label, FieldKind::Slider { min, max, step })
    }

    pub fn list(
        path: impl Into<String>,
        label: impl Into<String>,
        item_label: impl Into<String>,
        fields: Vec<SchemaField>,
        new_item: Value,
    ) -> Self {
        Self::new(
            path,
            label,
            FieldKind::List {
                item_label: item_label.into(),
                fields,
                new_item,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSection {
    pub title: String,
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub sections: Vec<SchemaSection>,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, title: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        self.sections.push(SchemaSection {
            title: title.into(),
            fields,
        });
        self
    }

    /// Top-level fields across all sections, in order
    pub fn fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Check structural rules: unique paths, sane sliders, no list inside a list
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();

        for field in self.fields() {
            if !seen.insert(field.path.as_str()) {
                return Err(SchemaError::DuplicatePath(field.path.clone()));
            }
            validate_field(field, false)?;
        }

        Ok(())
    }

    /// Field that governs `path`. List items are addressed as `list.<index>.<sub-path>`.
    pub fn field_at(&self, path: &str) -> Option<&SchemaField> {
        self.fields().find_map(|field| {
            if field.path == path {
                return Some(field);
            }

            let FieldKind::List { fields, .. } = &field.kind else {
                return None;
            };

            let rest = path.strip_prefix(field.path.as_str())?.strip_prefix('.')?;
            let (index, sub_path) = rest.split_once('.')?;
            index.parse::<usize>().ok()?;
            fields.iter().find(|f| f.path == sub_path)
        })
    }

    /// Validate `value` against the field at `path`. Paths outside the schema pass.
    pub fn check_value(&self, path: &str, value: &Value) -> Result<(), SchemaError> {
        match self.field_at(path) {
            Some(field) if !field.kind.accepts(value) => Err(SchemaError::Rejected {
                path: path.to_string(),
                expected: field.kind.expected(),
            }),
            _ => Ok(()),
        }
    }

    /// Fields whose current value on `block` does not fit their kind
    pub fn issues(&self, block: &Block) -> Vec<SchemaError> {
        self.fields()
            .filter_map(|field| {
                let value = block.get_path(&field.path)?;
                self.check_value(&field.path, &value).err()
            })
            .collect()
    }
}

fn validate_field(field: &SchemaField, inside_list: bool) -> Result<(), SchemaError> {
    match &field.kind {
        FieldKind::Slider { min, max, step } if min > max || *step <= 0.0 => {
            Err(SchemaError::InvalidSlider(field.path.clone()))
        }
        FieldKind::List { .. } if inside_list => Err(SchemaError::NestedList(field.path.clone())),
        FieldKind::List { fields, .. } => {
            fields.iter().try_for_each(|f| validate_field(f, true))
        }
        _ => Ok(()),
    }
}

/// One edit coming out of the generic form renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FormEdit {
    Set {
        path: String,
        value: Value,
    },
    /// Append to a repeated list; without `item` the schema's template is used
    AddItem {
        path: String,
        #[serde(default)]
        item: Option<Value>,
    },
    RemoveItem {
        path: String,
        index: usize,
    },
    MoveItem {
        path: String,
        index: usize,
        direction: ListMove,
    },
}

impl FormEdit {
    pub fn path(&self) -> &str {
        match self {
            FormEdit::Set { path, .. }
            | FormEdit::AddItem { path, .. }
            | FormEdit::RemoveItem { path, .. }
            | FormEdit::MoveItem { path, .. } => path,
        }
    }

    /// Apply to `block`, type-checking against `schema` when one is given
    pub fn apply(&self, block: &Block, schema: Option<&SchemaDescriptor>) -> Result<Block, SchemaError> {
        let edited = match self {
            FormEdit::Set { path, value } => {
                if let Some(schema) = schema {
                    schema.check_value(path, value)?;
                }
                block.set_path(path, value.clone())?
            }

            FormEdit::AddItem { path, item } => {
                let item = item
                    .clone()
                    .or_else(|| schema.and_then(|s| new_item_for(s, path)))
                    .unwrap_or_else(|| json!({}));
                block.edit_at(path, |record| insert_list_item(record, path, item))?
            }

            FormEdit::RemoveItem { path, index } => {
                block.edit_at(path, |record| remove_list_item(record, path, *index))?
            }

            FormEdit::MoveItem {
                path,
                index,
                direction,
            } => block.edit_at(path, |record| {
                move_list_item(record, path, *index, *direction)
            })?,
        };

        Ok(edited)
    }
}

fn new_item_for(schema: &SchemaDescriptor, path: &str) -> Option<Value> {
    match &schema.field_at(path)?.kind {
        FieldKind::List { new_item, .. } => Some(new_item.clone()),
        _ => None,
    }
}
