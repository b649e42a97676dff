//! Keyword search over mirrored catalog documents.
//!
//! # Invariants
//! - Only documents currently in the mirror are returned.
//! - Result ordering is deterministic by rank, kind and identity.

use super::{SearchError, SearchResult};
use crate::db::DbError;
use crate::model::{EntityId, EntityKind};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

const DEFAULT_LIMIT: u32 = 20;

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Optional index filter.
    pub kind: Option<EntityKind>,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl SearchQuery {
    /// Creates a query with default limit and no kind filter.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Single search hit returned by [`search_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub entity_id: EntityId,
    pub snippet: String,
}

/// Searches mirrored documents via FTS5 and returns ranked results.
///
/// Returns an empty list for blank queries or a zero limit.
pub fn search_all(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            d.kind AS kind,
            d.entity_id AS entity_id,
            snippet(search_documents_fts, 0, '[', ']', ' ... ', 10) AS snippet
         FROM search_documents_fts
         JOIN search_documents d ON d.doc_id = search_documents_fts.rowid
         WHERE search_documents_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if let Some(kind) = query.kind {
        sql.push_str(" AND d.kind = ?");
        bind_values.push(Value::Text(kind.as_str().to_string()));
    }

    sql.push_str(" ORDER BY bm25(search_documents_fts), d.kind ASC, d.entity_id ASC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();

    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(row)?);
    }

    Ok(hits)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let kind_text: String = row.get("kind")?;
    let kind = EntityKind::parse(&kind_text)
        .ok_or_else(|| SearchError::InvalidData(format!("invalid kind `{kind_text}`")))?;

    Ok(SearchHit {
        kind,
        entity_id: row.get("entity_id")?,
        snippet: row.get("snippet")?,
    })
}

fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }

    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_match_expression, SearchQuery};

    #[test]
    fn free_text_terms_are_quoted_and_joined() {
        let query = SearchQuery::new("  tehran  \"express\" ");
        assert_eq!(
            build_match_expression(&query).as_deref(),
            Some("\"tehran\" AND \"\"\"express\"\"\"")
        );
    }

    #[test]
    fn blank_text_has_no_expression() {
        assert_eq!(build_match_expression(&SearchQuery::new("   ")), None);
    }
}
