//! Cache Key Derivation
//!
//! Turns a search request into a stable cache identity and names the
//! per-record keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cache::CacheError;

// == Key Space ==
/// Prefix shared by every search result key.
pub const SEARCH_PREFIX: &str = "search:";

/// Key of the unfiltered search.
pub const SEARCH_ALL_KEY: &str = "search:all";

/// Prefix of single-record keys.
pub const RECORD_PREFIX: &str = "client:";

const PAIR_SEPARATOR: &str = "_";

// == Query Descriptor ==
/// Filters and pagination identifying one logical search request.
///
/// Equality follows the cache identity: absent and blank fields are ignored
/// and string values compare after trimming and lower-casing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// CPF fragment
    pub cpf: Option<String>,
    /// Name substring
    pub nome: Option<String>,
    /// City substring
    pub cidade: Option<String>,
    /// State code
    pub uf: Option<String>,
    /// Active flag
    pub ativo: Option<bool>,
    /// Page number
    pub page: Option<u32>,
    /// Page size
    pub size: Option<u32>,
}

impl QueryDescriptor {
    /// Creates an empty descriptor (the "list all" search).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a descriptor from `(field, value)` pairs in any order.
    ///
    /// Unknown field names and unparsable values are caller errors.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut descriptor = Self::new();
        for (field, value) in pairs {
            let (field, value) = (field.as_ref(), value.as_ref());
            match field {
                "cpf" => descriptor.cpf = Some(value.to_string()),
                "nome" => descriptor.nome = Some(value.to_string()),
                "cidade" => descriptor.cidade = Some(value.to_string()),
                "uf" => descriptor.uf = Some(value.to_string()),
                "ativo" => descriptor.ativo = Some(parse_field(field, value)?),
                "page" => descriptor.page = Some(parse_field(field, value)?),
                "size" => descriptor.size = Some(parse_field(field, value)?),
                other => return Err(CacheError::UnknownFilter(other.to_string())),
            }
        }
        Ok(descriptor)
    }

    pub fn with_cpf(mut self, cpf: impl Into<String>) -> Self {
        self.cpf = Some(cpf.into());
        self
    }

    pub fn with_nome(mut self, nome: impl Into<String>) -> Self {
        self.nome = Some(nome.into());
        self
    }

    pub fn with_cidade(mut self, cidade: impl Into<String>) -> Self {
        self.cidade = Some(cidade.into());
        self
    }

    pub fn with_uf(mut self, uf: impl Into<String>) -> Self {
        self.uf = Some(uf.into());
        self
    }

    pub fn with_ativo(mut self, ativo: bool) -> Self {
        self.ativo = Some(ativo);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Canonical `(field, value)` pairs, sorted by field name.
    ///
    /// Absent fields and strings that are blank after trimming are dropped.
    pub fn canonical_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = [
            ("ativo", self.ativo.map(|v| v.to_string())),
            ("cidade", normalize(self.cidade.as_deref())),
            ("cpf", normalize(self.cpf.as_deref())),
            ("nome", normalize(self.nome.as_deref())),
            ("page", self.page.map(|v| v.to_string())),
            ("size", self.size.map(|v| v.to_string())),
            ("uf", normalize(self.uf.as_deref())),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
        .collect();

        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// True when no field participates in the identity.
    pub fn is_empty(&self) -> bool {
        self.canonical_pairs().is_empty()
    }

    /// Cache key of this descriptor.
    pub fn search_key(&self) -> SearchKey {
        derive_search_key(self)
    }
}

impl PartialEq for QueryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_pairs() == other.canonical_pairs()
    }
}

impl Eq for QueryDescriptor {}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CacheError> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| CacheError::InvalidFilterValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

// == Search Key ==
/// Backing-store key of one cached search page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey(String);

impl SearchKey {
    /// Key of the unfiltered search.
    pub fn all() -> Self {
        Self(SEARCH_ALL_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the fixed `search:all` key.
    pub fn is_all(&self) -> bool {
        self.0 == SEARCH_ALL_KEY
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Derivation ==
/// Derives the cache key of a search request.
///
/// Pure: the key depends only on the canonical pairs of the descriptor. An
/// empty descriptor maps to the literal `search:all`; anything else maps to
/// `search:` followed by the SHA-256 hex digest of `field:value` pairs joined
/// with `_`, where `\`, `_` and `:` inside values are backslash-escaped.
pub fn derive_search_key(descriptor: &QueryDescriptor) -> SearchKey {
    let pairs = descriptor.canonical_pairs();
    if pairs.is_empty() {
        return SearchKey::all();
    }

    let joined = pairs
        .iter()
        .map(|(field, value)| format!("{field}:{}", escape_value(value)))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR);

    let digest = Sha256::digest(joined.as_bytes());
    SearchKey(format!("{SEARCH_PREFIX}{}", hex::encode(digest)))
}

/// Backslash-escapes separators so a value cannot imitate further pairs.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '_' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Backing-store key of a single record.
pub fn record_key(id: i64) -> String {
    format!("{RECORD_PREFIX}{id}")
}
