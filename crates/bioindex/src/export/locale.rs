//! Column-name translation applied at the export boundary.

use serde::{Deserialize, Serialize};

use crate::tabular::{Record, Table};

/// Output language for column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    /// Column names as produced by the tabularizer.
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    /// Brazilian Portuguese column names.
    #[serde(rename = "pt-BR")]
    PtBr,
}

const PT_BR: &[(&str, &str)] = &[
    ("id", "id"),
    ("hash", "hash"),
    ("version", "versao"),
    ("updatedAt", "atualizadoEm"),
    ("sample", "amostra"),
    ("ggh", "ggh"),
    ("dimension", "dimensao"),
    ("process", "processo"),
    ("group", "grupo"),
    ("taxonomicGroup", "grupoTaxonomico"),
    ("metric", "metrica"),
    ("value", "valor"),
    ("inverseConfidence", "confiancaInversa"),
    ("key", "chave"),
    ("keyType", "tipoChave"),
    ("count", "contagem"),
    ("isPathogenic", "patogenico"),
    ("taxon", "taxon"),
];

impl Locale {
    /// Translate a single column name; unknown names pass through.
    pub fn column<'a>(&self, name: &'a str) -> &'a str {
        match self {
            Locale::EnUs => name,
            Locale::PtBr => PT_BR
                .iter()
                .find(|(en, _)| *en == name)
                .map(|(_, pt)| *pt)
                .unwrap_or(name),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Locale::EnUs),
            "pt-br" | "pt" => Ok(Locale::PtBr),
            _ => Err(format!("Unknown locale: {}. Use en-US or pt-BR.", s)),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::EnUs => write!(f, "en-US"),
            Locale::PtBr => write!(f, "pt-BR"),
        }
    }
}

/// Rename the columns of a record for `locale`. Values and column order are
/// unchanged.
pub fn translate(record: Record, locale: Locale) -> Record {
    if locale == Locale::EnUs {
        return record;
    }
    record
        .into_iter()
        .map(|(column, value)| (locale.column(&column).to_string(), value))
        .collect()
}

/// Rename the declared columns and every record of a table.
pub fn translate_table(table: Table, locale: Locale) -> Table {
    Table {
        name: table.name,
        columns: table
            .columns
            .iter()
            .map(|c| locale.column(c).to_string())
            .collect(),
        records: table
            .records
            .into_iter()
            .map(|r| translate(r, locale))
            .collect(),
    }
}
