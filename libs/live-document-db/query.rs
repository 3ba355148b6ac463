use serde_json::Value as JsonValue;

/// Predicate over a document. `Id` matches the document key (which never
/// appears in the body); the field variants walk the body, with dotted
/// paths reaching nested objects ("owner.id").
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id { value: String },
    Eq { field: String, value: JsonValue },
    ArrayContains { field: String, value: JsonValue },
    Prefix { field: String, value: String },
}

impl Filter {
    pub fn id(value: &str) -> Self {
        Filter::Id {
            value: value.to_string(),
        }
    }

    pub fn eq<V: Into<JsonValue>>(field: &str, value: V) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn array_contains<V: Into<JsonValue>>(field: &str, value: V) -> Self {
        Filter::ArrayContains {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn prefix(field: &str, value: &str) -> Self {
        Filter::Prefix {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches(&self, document_id: &str, document: &JsonValue) -> bool {
        match self {
            Filter::All => true,
            Filter::Id { value } => document_id == value,
            Filter::Eq { field, value } => lookup_path(document, field) == Some(value),
            Filter::ArrayContains { field, value } => lookup_path(document, field)
                .and_then(JsonValue::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
            Filter::Prefix { field, value } => lookup_path(document, field)
                .and_then(JsonValue::as_str)
                .map(|text| text.starts_with(value.as_str()))
                .unwrap_or(false),
        }
    }
}

fn lookup_path<'a>(document: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = document;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

#[derive(Debug, Clone)]
pub struct Query {
    pub filter: Filter,
    pub order_by: Option<String>,
}

impl Query {
    pub fn all() -> Self {
        Self {
            filter: Filter::All,
            order_by: None,
        }
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }
}

/// Numeric sort key for ascending ordering; documents missing the field
/// sort first.
pub(crate) fn order_key(document: &JsonValue, field: &str) -> f64 {
    lookup_path(document, field)
        .and_then(JsonValue::as_f64)
        .unwrap_or(f64::MIN)
}
