//! Client record types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::records::validation::{
    format_cpf, is_valid_email, is_valid_sexo, is_valid_uf, validate_cpf,
};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 255;

// Upper bounds, in characters, of the optional text fields
const LONG_TEXT_MAX: usize = 255;
const PHONE_MAX: usize = 20;
const CEP_MAX: usize = 9;
const NUMERO_MAX: usize = 10;
const LOCALITY_MAX: usize = 100;

// == Client ==
/// A stored client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id_cliente: i64,
    /// Formatted as `XXX.XXX.XXX-XX`
    pub cpf: String,
    pub nome_completo: String,
    pub data_nascimento: Option<NaiveDate>,
    pub sexo: Option<String>,
    pub nome_mae: Option<String>,
    pub nome_pai: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub celular: Option<String>,
    pub cep: Option<String>,
    pub endereco: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// == Client Create ==
/// Payload of `POST /api/v1/clients`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientCreate {
    pub cpf: String,
    pub nome_completo: String,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub nome_mae: Option<String>,
    #[serde(default)]
    pub nome_pai: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

fn default_ativo() -> bool {
    true
}

impl ClientCreate {
    /// Validates the payload.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !validate_cpf(&self.cpf) {
            return Some("Invalid CPF".to_string());
        }
        validate_name(&self.nome_completo)
            .or_else(|| validate_optional(self.sexo.as_deref(), self.uf.as_deref(), self.email.as_deref()))
            .or_else(|| {
                validate_lengths(&[
                    ("nome_mae", self.nome_mae.as_deref(), LONG_TEXT_MAX),
                    ("nome_pai", self.nome_pai.as_deref(), LONG_TEXT_MAX),
                    ("telefone", self.telefone.as_deref(), PHONE_MAX),
                    ("celular", self.celular.as_deref(), PHONE_MAX),
                    ("cep", self.cep.as_deref(), CEP_MAX),
                    ("endereco", self.endereco.as_deref(), LONG_TEXT_MAX),
                    ("numero", self.numero.as_deref(), NUMERO_MAX),
                    ("complemento", self.complemento.as_deref(), LONG_TEXT_MAX),
                    ("bairro", self.bairro.as_deref(), LOCALITY_MAX),
                    ("cidade", self.cidade.as_deref(), LOCALITY_MAX),
                ])
            })
    }

    /// Builds the stored record with canonical CPF and upper-case UF.
    pub fn into_client(self, id_cliente: i64, created_at: DateTime<Utc>) -> Client {
        Client {
            id_cliente,
            cpf: format_cpf(&self.cpf),
            nome_completo: self.nome_completo.trim().to_string(),
            data_nascimento: self.data_nascimento,
            sexo: self.sexo,
            nome_mae: self.nome_mae,
            nome_pai: self.nome_pai,
            email: self.email,
            telefone: self.telefone,
            celular: self.celular,
            cep: self.cep,
            endereco: self.endereco,
            numero: self.numero,
            complemento: self.complemento,
            bairro: self.bairro,
            cidade: self.cidade,
            uf: self.uf.map(|uf| uf.to_uppercase()),
            ativo: self.ativo,
            created_at,
            updated_at: None,
        }
    }
}

// == Client Update ==
/// Payload of `PUT /api/v1/clients/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    #[serde(default)]
    pub nome_completo: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub nome_mae: Option<String>,
    #[serde(default)]
    pub nome_pai: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
    #[serde(default)]
    pub ativo: Option<bool>,
}

impl ClientUpdate {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        self.nome_completo
            .as_deref()
            .and_then(validate_name)
            .or_else(|| validate_optional(self.sexo.as_deref(), self.uf.as_deref(), self.email.as_deref()))
            .or_else(|| {
                validate_lengths(&[
                    ("nome_mae", self.nome_mae.as_deref(), LONG_TEXT_MAX),
                    ("nome_pai", self.nome_pai.as_deref(), LONG_TEXT_MAX),
                    ("telefone", self.telefone.as_deref(), PHONE_MAX),
                    ("celular", self.celular.as_deref(), PHONE_MAX),
                    ("cep", self.cep.as_deref(), CEP_MAX),
                    ("endereco", self.endereco.as_deref(), LONG_TEXT_MAX),
                    ("numero", self.numero.as_deref(), NUMERO_MAX),
                    ("complemento", self.complemento.as_deref(), LONG_TEXT_MAX),
                    ("bairro", self.bairro.as_deref(), LOCALITY_MAX),
                    ("cidade", self.cidade.as_deref(), LOCALITY_MAX),
                ])
            })
    }

    /// Copies every present field onto `client`.
    pub fn apply_to(self, client: &mut Client) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if let Some(nome) = self.nome_completo {
            client.nome_completo = nome.trim().to_string();
        }
        if let Some(ativo) = self.ativo {
            client.ativo = ativo;
        }
        set(&mut client.data_nascimento, self.data_nascimento);
        set(&mut client.sexo, self.sexo);
        set(&mut client.nome_mae, self.nome_mae);
        set(&mut client.nome_pai, self.nome_pai);
        set(&mut client.email, self.email);
        set(&mut client.telefone, self.telefone);
        set(&mut client.celular, self.celular);
        set(&mut client.cep, self.cep);
        set(&mut client.endereco, self.endereco);
        set(&mut client.numero, self.numero);
        set(&mut client.complemento, self.complemento);
        set(&mut client.bairro, self.bairro);
        set(&mut client.cidade, self.cidade);
        set(&mut client.uf, self.uf.map(|uf| uf.to_uppercase()));
    }
}

fn validate_name(nome: &str) -> Option<String> {
    let len = nome.trim().chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Some(format!(
            "nome_completo must have between {} and {} characters",
            NAME_MIN, NAME_MAX
        ));
    }
    None
}

fn validate_optional(sexo: Option<&str>, uf: Option<&str>, email: Option<&str>) -> Option<String> {
    if sexo.is_some_and(|s| !is_valid_sexo(s)) {
        return Some("sexo must be 'M' or 'F'".to_string());
    }
    if uf.is_some_and(|u| !is_valid_uf(u)) {
        return Some("uf must be a two-letter state code".to_string());
    }
    if email.is_some_and(|e| !is_valid_email(e)) {
        return Some("Invalid email address".to_string());
    }
    None
}

fn validate_lengths(fields: &[(&str, Option<&str>, usize)]) -> Option<String> {
    fields.iter().find_map(|(name, value, max)| {
        value
            .filter(|v| v.chars().count() > *max)
            .map(|_| format!("{} must have at most {} characters", name, max))
    })
}

// == Search Filter ==
/// Record predicates of a search; blank strings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Digit substring of the CPF
    pub cpf: Option<String>,
    /// Case-insensitive substring of the full name
    pub nome: Option<String>,
    /// Case-insensitive substring of the city
    pub cidade: Option<String>,
    /// Exact state code, case-insensitive
    pub uf: Option<String>,
    pub ativo: Option<bool>,
}

// == Search Page ==
/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<Client>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u64,
}

impl SearchPage {
    /// Wraps a page of items; `pages` is `ceil(total / size)`.
    pub fn new(items: Vec<Client>, total: u64, page: u32, size: u32) -> Self {
        let pages = if size == 0 {
            0
        } else {
            total.div_ceil(u64::from(size))
        };
        Self {
            items,
            total,
            page,
            size,
            pages,
        }
    }
}
