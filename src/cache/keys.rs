use crate::domain::entities::Entity;

pub const DEFAULT_REPRESENTATION: &str = "html";

/// Cache id of a rendered page: `<id>.<representation>`, or
/// `<id>.<lang>.<representation>` when a language is active.
pub fn page_cache_id(entity: &Entity, language: Option<&str>, representation: &str) -> String {
    let representation = match representation.trim() {
        "" => DEFAULT_REPRESENTATION,
        other => other,
    };
    match language {
        Some(code) => format!("{}.{code}.{representation}", entity.id()),
        None => format!("{}.{representation}", entity.id()),
    }
}
