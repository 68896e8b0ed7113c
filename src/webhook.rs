//! Webhook related structures

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// GitLab push hook payload.
///
/// Every field is optional on the wire; absent or `null` fields decode to
/// their zero value so a payload carrying only `repository.name` is still
/// dispatched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Webhook {
    #[serde(deserialize_with = "null_as_default")]
    pub before: String,
    #[serde(deserialize_with = "null_as_default")]
    pub after: String,
    #[serde(rename = "ref", deserialize_with = "null_as_default")]
    pub reference: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
    pub total_commits_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub description: Option<String>,
    #[serde(alias = "homepage", deserialize_with = "null_as_default")]
    pub home_page: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: Author,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Webhook {
    /// Decode a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Name of the pushed repository, the only field dispatch looks at.
    pub fn repository_name(&self) -> &str {
        &self.repository.name
    }

    /// Branch name with the `refs/heads/` prefix removed.
    pub fn branch(&self) -> &str {
        self.reference
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.reference)
    }
}
