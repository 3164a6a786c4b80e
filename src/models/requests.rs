//! Request DTOs for the API
//!
//! Defines the query string of the search endpoint and its page limits.

use serde::Deserialize;

use crate::cache::QueryDescriptor;
use crate::records::SearchFilter;

/// Default and maximum page size accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 50,
            max_size: 100,
        }
    }
}

/// Query string of `GET /api/v1/clients/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// CPF fragment, punctuation ignored
    pub cpf: Option<String>,
    /// Name or part of the name
    pub nome: Option<String>,
    pub cidade: Option<String>,
    /// State code
    pub uf: Option<String>,
    pub ativo: Option<bool>,
    /// Page number, from 1
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SearchParams {
    /// Resolves page and size against `limits`.
    ///
    /// Returns an error message when either is out of range.
    pub fn page_and_size(&self, limits: PageLimits) -> Result<(u32, u32), String> {
        let page = self.page.unwrap_or(1);
        let size = self.size.unwrap_or(limits.default_size);

        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if !(1..=limits.max_size).contains(&size) {
            return Err(format!("size must be between 1 and {}", limits.max_size));
        }
        Ok((page, size))
    }

    /// Cache identity of this search.
    ///
    /// The first page at the default size carries no pagination fields, so
    /// the unfiltered listing lands on `search:all`.
    pub fn descriptor(&self, limits: PageLimits) -> QueryDescriptor {
        QueryDescriptor {
            cpf: self.cpf.clone(),
            nome: self.nome.clone(),
            cidade: self.cidade.clone(),
            uf: self.uf.clone(),
            ativo: self.ativo,
            page: self.page.filter(|page| *page != 1),
            size: self.size.filter(|size| *size != limits.default_size),
        }
    }

    /// Record predicates of this search.
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            cpf: self.cpf.clone(),
            nome: self.nome.clone(),
            cidade: self.cidade.clone(),
            uf: self.uf.clone(),
            ativo: self.ativo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SearchKey;

    #[test]
    fn test_search_params_deserialize() {
        let json = r#"{"nome": "Maria", "ativo": true, "page": 2}"#;
        let params: SearchParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.nome.as_deref(), Some("Maria"));
        assert_eq!(params.ativo, Some(true));
        assert_eq!(params.page, Some(2));
        assert!(params.size.is_none());
    }

    #[test]
    fn test_page_and_size_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.page_and_size(PageLimits::default()), Ok((1, 50)));
    }

    #[test]
    fn test_page_and_size_limits() {
        let limits = PageLimits::default();
        let zero_page = SearchParams {
            page: Some(0),
            ..SearchParams::default()
        };
        assert!(zero_page.page_and_size(limits).is_err());

        let too_big = SearchParams {
            size: Some(101),
            ..SearchParams::default()
        };
        assert!(too_big.page_and_size(limits).is_err());
    }

    #[test]
    fn test_first_default_page_is_search_all() {
        let limits = PageLimits::default();
        let explicit = SearchParams {
            page: Some(1),
            size: Some(50),
            ..SearchParams::default()
        };

        assert_eq!(explicit.descriptor(limits).search_key(), SearchKey::all());
        assert_eq!(SearchParams::default().descriptor(limits).search_key(), SearchKey::all());
    }

    #[test]
    fn test_pagination_changes_key() {
        let limits = PageLimits::default();
        let second = SearchParams {
            page: Some(2),
            ..SearchParams::default()
        };
        assert_ne!(second.descriptor(limits).search_key(), SearchKey::all());
    }
}
