//! Program model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::util::parse_timestamp;

/// Identifier assigned to a program by the remote catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(i64);

impl ProgramId {
    /// Wrap a raw catalog identifier
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value as stored in the database
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProgramId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// An academic program (filière) in the catalog
///
/// The same shape is used for the remote copy and the local row; every field
/// besides `id` is replaced when a newer remote copy is absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Catalog identifier
    pub id: ProgramId,
    /// Program name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Whether a baccalaureate is required
    pub bacc: bool,
    /// Where the program is taught
    pub location: String,
    /// Enrollment opening date, as published
    pub inscription_open: Option<String>,
    /// Enrollment closing date, as published
    pub inscription_closed: Option<String>,
    /// Tuition fees, as published
    pub fees: Option<String>,
    /// Bank account for fee payment
    pub bank_account: Option<String>,
    /// Holder of `bank_account`
    pub bank_account_owner: Option<String>,
    /// Admission requirements
    pub admission: Option<String>,
    /// Link to the program brochure
    pub document: Option<String>,
    /// Domain (category) the program belongs to
    pub domain: String,
    /// Last modification on the remote side
    pub updated_at: DateTime<Utc>,
}

impl Program {
    /// Whether `other` carries a strictly newer modification time
    #[must_use]
    pub fn is_older_than(&self, other: &Self) -> bool {
        self.updated_at < other.updated_at
    }
}

/// Wire representation of a program as served by the remote catalog
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDoc {
    pub id: i64,
    #[serde(rename = "filiere", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bacc: Option<bool>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub inscription_open: Option<String>,
    #[serde(default)]
    pub inscription_closed: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub fees: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub bank_account_owner: Option<String>,
    #[serde(default)]
    pub admission: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default, rename = "domaine", alias = "domain")]
    pub domain: Option<String>,
    pub updated_at: String,
}

impl TryFrom<ProgramDoc> for Program {
    type Error = String;

    fn try_from(doc: ProgramDoc) -> Result<Self, Self::Error> {
        let updated_at = parse_timestamp(&doc.updated_at).ok_or_else(|| {
            format!(
                "program {} has an invalid updated_at '{}'",
                doc.id, doc.updated_at
            )
        })?;

        Ok(Self {
            id: ProgramId::new(doc.id),
            name: doc.name,
            description: doc.description.unwrap_or_default(),
            bacc: doc.bacc.unwrap_or_default(),
            location: doc.location.unwrap_or_default(),
            inscription_open: doc.inscription_open,
            inscription_closed: doc.inscription_closed,
            fees: doc.fees,
            bank_account: doc.bank_account,
            bank_account_owner: doc.bank_account_owner,
            admission: doc.admission,
            document: doc.document,
            domain: doc.domain.unwrap_or_default(),
            updated_at,
        })
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}
