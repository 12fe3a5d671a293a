use crate::client::FOLDER_MIME_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Any,
    Folder,
}

/// Escapes a value for use inside a single-quoted Drive query literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Builds a `q` expression matching non-trashed objects named exactly `name`.
pub fn name_query(name: &str, kind: QueryKind) -> String {
    let mut query = format!("name = '{}' and trashed = false", escape_literal(name));
    if kind == QueryKind::Folder {
        query.push_str(&format!(" and mimeType = '{FOLDER_MIME_TYPE}'"));
    }
    query
}
