//! Flat-file field codec.
//!
//! ```text
//! Title: Hello
//!
//! ----
//!
//! Text:
//!
//! First paragraph
//! Second paragraph
//! ```
//!
//! Keys are written slugged with an upper-case first letter and read back
//! lower-cased with `-` and spaces folded to `_`. Value lines starting with
//! `----` are escaped as `\----` so they cannot split a field.

use slug::slugify;

use super::Fields;

const SEPARATOR: &str = "----";
const ESCAPED_SEPARATOR: &str = "\\----";
const BOM: char = '\u{feff}';

/// Encode fields into the flat-file text format.
pub fn encode(fields: &Fields) -> String {
    let mut blocks = Vec::with_capacity(fields.len());

    for (key, value) in fields {
        let key = encode_key(key);
        if key.is_empty() {
            continue;
        }

        let value = escape(value.trim());
        let block = if value.contains('\n') {
            format!("{key}:\n\n{value}")
        } else if value.is_empty() {
            format!("{key}:")
        } else {
            format!("{key}: {value}")
        };
        blocks.push(block);
    }

    blocks.join(&format!("\n\n{SEPARATOR}\n\n"))
}

/// Decode the flat-file text format. Blocks without a `key:` prefix are skipped.
pub fn decode(text: &str) -> Fields {
    let text = text.strip_prefix(BOM).unwrap_or(text).replace("\r\n", "\n");

    let mut fields = Fields::new();
    let mut block = String::new();

    for line in text.split('\n') {
        if line.trim_end() == SEPARATOR {
            insert_block(&mut fields, &block);
            block.clear();
            continue;
        }
        block.push_str(line);
        block.push('\n');
    }
    insert_block(&mut fields, &block);

    fields
}

/// Normalize a field key the way it reads back from disk.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Re-key `fields` with [`normalize_key`] so they match what reading gives
/// back. Keys that normalize to the same name keep the last value in map
/// order; keys that normalize to nothing are dropped.
pub fn normalize_fields(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn insert_block(fields: &mut Fields, block: &str) {
    let Some((key, value)) = block.split_once(':') else {
        return;
    };
    let key = normalize_key(key);
    if key.is_empty() || key.contains('\n') {
        return;
    }
    fields.insert(key, unescape(value.trim()));
}

fn encode_key(key: &str) -> String {
    let slugged = slugify(key);
    let mut chars = slugged.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape(value: &str) -> String {
    map_lines(value, |line| {
        if line.starts_with(SEPARATOR) {
            format!("\\{line}")
        } else {
            line.to_string()
        }
    })
}

fn unescape(value: &str) -> String {
    map_lines(value, |line| match line.strip_prefix('\\') {
        Some(rest) if line.starts_with(ESCAPED_SEPARATOR) => rest.to_string(),
        _ => line.to_string(),
    })
}

fn map_lines(value: &str, f: impl Fn(&str) -> String) -> String {
    value.split('\n').map(f).collect::<Vec<_>>().join("\n")
}
