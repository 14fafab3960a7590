//! Relevance guard
//!
//! A cheap lexical pre-filter run before retrieval. It only has to reject
//! queries that are plainly about something else; the retriever's similarity
//! threshold remains the real gate, so the guard errs on the side of passing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::lexical;
use crate::store::VectorStore;

/// Shortest term considered for prefix matching
const MIN_MATCH_LEN: usize = 3;

/// Built-in vocabulary, in normalized (lower-cased, stemmed) form
///
/// Covers SQL and PostgreSQL terms plus the everyday words people use for
/// them ("sort", "duplicate", "field"). Matched by prefix in both directions.
const DOMAIN_VOCABULARY: &[&str] = &[
    "aggregate", "alter", "analyze", "array", "ascending", "authentication", "autovacuum",
    "average", "backup", "begin", "bloat", "boolean", "btree", "buffer", "cast", "character",
    "checkpoint", "cluster", "coalesce", "collation", "column", "comment", "commit", "concat",
    "concurren", "config", "conflict", "connect", "constraint", "copy", "count", "create",
    "cursor", "data", "database", "date", "deadlock", "default", "delete", "descending",
    "discard", "distinct", "domain", "drop", "dump", "duplicate", "encoding", "enum", "error",
    "execute", "explain", "expression", "extension", "extract", "fetch", "field", "filter",
    "foreign", "format", "function", "grant", "group", "having", "heap", "import", "index",
    "insert", "integer", "interval", "isolation", "join", "json", "jsonb", "key", "lateral",
    "limit", "listen", "lock", "materialized", "merge", "migrat", "modify", "mvcc", "notify",
    "null", "numeric", "offset", "operator", "order", "parameter", "partition", "password",
    "pattern", "performance", "permission", "plan", "policy", "postgres", "postgresql",
    "prepare", "primary", "privilege", "procedure", "psql", "publication", "query", "rank",
    "record", "recursive", "refresh", "regex", "reindex", "remove", "rename", "replica",
    "replication", "restore", "result", "retrieve", "returning", "revoke", "role", "rollback",
    "row", "rule", "savepoint", "schema", "search", "select", "sequence", "serial", "server",
    "setting", "sort", "sql", "statement", "statistic", "string", "subquery", "subscription",
    "substring", "sum", "table", "tablespace", "temporary", "text", "time", "timestamp",
    "timezone", "toast", "transaction", "trigger", "truncate", "tuple", "type", "union",
    "unique", "unlogged", "update", "upgrade", "upsert", "user", "uuid", "vacuum", "value",
    "varchar", "view", "wal", "window", "work_mem",
];

/// Upper-case tokens that mark a query as SQL even when they are stop words
const SQL_KEYWORDS: &[&str] = &[
    "ALTER", "AND", "AS", "BEGIN", "BY", "COMMIT", "COPY", "CREATE", "DELETE", "DISTINCT",
    "DROP", "EXPLAIN", "FROM", "GRANT", "GROUP", "HAVING", "INDEX", "INNER", "INSERT", "INTO",
    "JOIN", "LEFT", "LIMIT", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER", "REVOKE", "RIGHT",
    "ROLLBACK", "SELECT", "SET", "TABLE", "TRUNCATE", "UNION", "UPDATE", "VACUUM", "VALUES",
    "VIEW", "WHERE", "WITH",
];

/// Guard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// When false every non-empty query passes
    pub enabled: bool,
    /// Additional vocabulary terms
    pub extra_keywords: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extra_keywords: Vec::new(),
        }
    }
}

/// Lexical in-domain predicate
#[derive(Debug, Clone)]
pub struct RelevanceGuard {
    enabled: bool,
    vocabulary: Vec<String>,
    /// Exact-match terms taken from the indexed corpus
    corpus_terms: HashSet<String>,
}

impl RelevanceGuard {
    pub fn new(config: &GuardConfig) -> Self {
        let mut vocabulary: Vec<String> = DOMAIN_VOCABULARY.iter().map(|w| w.to_string()).collect();
        vocabulary.extend(config.extra_keywords.iter().flat_map(|k| lexical::terms(k)));
        vocabulary.sort();
        vocabulary.dedup();

        Self {
            enabled: config.enabled,
            vocabulary,
            corpus_terms: HashSet::new(),
        }
    }

    /// Also accept any term that occurs in the store's chunks, section
    /// titles or document names
    pub fn with_store_vocabulary(mut self, store: &VectorStore) -> Self {
        for entry in store.entries() {
            for text in [&entry.text, &entry.section_title, &entry.doc_name] {
                self.corpus_terms.extend(
                    lexical::terms(text)
                        .into_iter()
                        .filter(|term| term.chars().count() >= MIN_MATCH_LEN),
                );
            }
        }
        debug!(terms = self.corpus_terms.len(), "guard loaded corpus vocabulary");
        self
    }

    /// Whether `query` could plausibly be answered from the corpus
    pub fn is_potentially_relevant(&self, query: &str) -> bool {
        if !query.chars().any(char::is_alphanumeric) {
            debug!("guard rejected empty query");
            return false;
        }
        if !self.enabled {
            return true;
        }

        let verdict = self.has_sql_keyword(query) || self.has_domain_term(query);
        debug!(query, verdict, "guard verdict");
        verdict
    }

    fn has_sql_keyword(&self, query: &str) -> bool {
        query
            .split(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
            .filter(|token| token.len() >= 2)
            .any(|token| {
                token.chars().all(|c| c.is_ascii_uppercase()) && SQL_KEYWORDS.contains(&token)
            })
    }

    fn has_domain_term(&self, query: &str) -> bool {
        lexical::terms(query)
            .iter()
            .filter(|term| term.chars().count() >= MIN_MATCH_LEN)
            .any(|term| self.corpus_terms.contains(term) || self.matches_vocabulary(term))
    }

    fn matches_vocabulary(&self, term: &str) -> bool {
        self.vocabulary
            .iter()
            .any(|word| term.starts_with(word.as_str()) || word.starts_with(term))
    }
}

impl Default for RelevanceGuard {
    fn default() -> Self {
        Self::new(&GuardConfig::default())
    }
}
