//! Shape checks for `parley.json5` layers.
//!
//! Every layer is checked on its own so that errors point at the file that
//! introduced them. Range checks live in `ParleyConfig::validate`.

use crate::ConfigError;
use serde_json::Value;

/// Expected shape of a leaf value.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Flag,
    Number,
    Count,
    OneOf(&'static [&'static str]),
}

impl Kind {
    fn check(self, value: &Value) -> Result<(), &'static str> {
        match self {
            Kind::Text if value.is_string() => Ok(()),
            Kind::Text => Err("expected string"),
            Kind::Flag if value.is_boolean() => Ok(()),
            Kind::Flag => Err("expected bool"),
            Kind::Number if value.is_number() => Ok(()),
            Kind::Number => Err("expected number"),
            Kind::Count if value.is_u64() => Ok(()),
            Kind::Count => Err("expected non-negative integer"),
            Kind::OneOf(options) => match value.as_str() {
                Some(text) if options.contains(&text) => Ok(()),
                Some(_) => Err("unsupported value"),
                None => Err("expected string"),
            },
        }
    }
}

type Section = (&'static str, &'static [(&'static str, Kind)]);

const SECTIONS: &[Section] = &[
    (
        "assistant",
        &[
            ("persona", Kind::Text),
            ("additional_instructions", Kind::Text),
            ("prefix", Kind::Text),
            ("apology", Kind::Text),
        ],
    ),
    (
        "memory",
        &[
            ("context_turns", Kind::Count),
            ("summary_max_words", Kind::Count),
            ("update_mode", Kind::OneOf(&["background", "inline"])),
        ],
    ),
    (
        "model",
        &[
            ("provider", Kind::OneOf(&["openai"])),
            ("name", Kind::Text),
            ("reply_temperature", Kind::Number),
            ("summary_temperature", Kind::Number),
            ("timeout_secs", Kind::Count),
            ("max_retries", Kind::Count),
            ("retry_backoff_ms", Kind::Count),
        ],
    ),
    ("store", &[("path", Kind::Text)]),
    ("concurrency", &[("serialize_per_channel", Kind::Flag)]),
];

/// Check one layer (or the merged document) against the known sections.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let Value::Object(root) = value else {
        return Err(invalid_field(layer, "<root>", "expected object"));
    };
    for (name, section) in root {
        if name == "$schema" {
            Kind::Text
                .check(section)
                .map_err(|reason| invalid_field(layer, name, reason))?;
            continue;
        }
        let Some(fields) = lookup(SECTIONS, name) else {
            return Err(invalid_field(layer, name, "unknown key"));
        };
        let Value::Object(entries) = section else {
            return Err(invalid_field(layer, name, "expected object"));
        };
        for (key, entry) in entries {
            let field = format!("{name}.{key}");
            let Some(kind) = lookup(fields, key) else {
                return Err(invalid_field(layer, &field, "unknown key"));
            };
            kind.check(entry)
                .map_err(|reason| invalid_field(layer, &field, reason))?;
        }
    }
    Ok(())
}

fn lookup<'a, T>(table: &'a [(&'static str, T)], key: &str) -> Option<&'a T> {
    table
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, value)| value)
}

fn invalid_field(layer: &str, field: &str, reason: &str) -> ConfigError {
    ConfigError::Field {
        origin: layer.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
