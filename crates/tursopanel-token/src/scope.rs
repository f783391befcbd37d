//! Token scope resolution.
//!
//! A caller states explicitly whether it refers to a database or group by row
//! id or by name. Ids are looked up through a [`Directory`]; names are used as
//! the claim subject verbatim, so a database literally named `"123"` is never
//! confused with row id 123.

use crate::claims::Grantee;
use crate::error::TokenError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How a caller identifies a database or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Row id, resolved to a name through the directory.
    Id(u64),
    /// Literal name.
    Name(String),
}

/// What a token grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single database (including schema and child databases).
    Database(Subject),
    /// A named group of databases.
    Group(Subject),
}

impl Target {
    /// Whether this target is a group of databases.
    pub fn is_group(&self) -> bool {
        matches!(self, Target::Group(_))
    }

    /// The subject, whatever the target kind.
    pub fn subject(&self) -> &Subject {
        match self {
            Target::Database(subject) | Target::Group(subject) => subject,
        }
    }
}

/// A token request before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScope {
    pub target: Target,
    pub grantee: Grantee,
}

/// A token request after resolution: everything the minter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScope {
    /// Name placed in the `id` / `jti` claims.
    pub subject: String,
    /// Whether the `is_group` header flag is set.
    pub is_group: bool,
    pub grantee: Grantee,
}

/// Name lookups for row ids.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Name of the database with this id, if it exists.
    async fn database_name(&self, id: u64) -> Result<Option<String>, TokenError>;

    /// Name of the group with this id, if it exists.
    async fn group_name(&self, id: u64) -> Result<Option<String>, TokenError>;
}

/// Resolves [`TokenScope`]s against a [`Directory`].
pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolve a scope.
    pub async fn resolve(
        scope: &TokenScope,
        directory: &dyn Directory,
    ) -> Result<ResolvedScope, TokenError> {
        let subject = match &scope.target {
            Target::Database(Subject::Id(id)) => directory
                .database_name(*id)
                .await?
                .ok_or(TokenError::UnknownSubject { kind: "database", id: *id })?,
            Target::Group(Subject::Id(id)) => directory
                .group_name(*id)
                .await?
                .ok_or(TokenError::UnknownSubject { kind: "group", id: *id })?,
            Target::Database(Subject::Name(name)) | Target::Group(Subject::Name(name)) => {
                name.clone()
            }
        };

        tracing::debug!(
            subject = %subject,
            is_group = scope.target.is_group(),
            "resolved token scope"
        );

        Ok(ResolvedScope {
            subject,
            is_group: scope.target.is_group(),
            grantee: scope.grantee,
        })
    }
}

/// A directory that knows no ids. Useful when every subject is a name.
#[derive(Debug, Default)]
pub struct NoDirectory;

#[async_trait]
impl Directory for NoDirectory {
    async fn database_name(&self, _id: u64) -> Result<Option<String>, TokenError> {
        Ok(None)
    }

    async fn group_name(&self, _id: u64) -> Result<Option<String>, TokenError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapDirectory {
        databases: HashMap<u64, String>,
        groups: HashMap<u64, String>,
    }

    #[async_trait]
    impl Directory for MapDirectory {
        async fn database_name(&self, id: u64) -> Result<Option<String>, TokenError> {
            Ok(self.databases.get(&id).cloned())
        }

        async fn group_name(&self, id: u64) -> Result<Option<String>, TokenError> {
            Ok(self.groups.get(&id).cloned())
        }
    }

    fn directory() -> MapDirectory {
        MapDirectory {
            databases: HashMap::from([(123, "orders".to_string())]),
            groups: HashMap::from([(9, "analytics".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_id_subject_uses_lookup() {
        let scope = TokenScope {
            target: Target::Database(Subject::Id(123)),
            grantee: Grantee::User(42),
        };
        let resolved = ScopeResolver::resolve(&scope, &directory()).await.unwrap();
        assert_eq!(resolved.subject, "orders");
        assert!(!resolved.is_group);
    }

    #[tokio::test]
    async fn test_all_digit_name_is_literal() {
        let scope = TokenScope {
            target: Target::Database(Subject::Name("123".to_string())),
            grantee: Grantee::User(42),
        };
        let resolved = ScopeResolver::resolve(&scope, &directory()).await.unwrap();
        assert_eq!(resolved.subject, "123");
    }

    #[tokio::test]
    async fn test_group_target_sets_flag() {
        let scope = TokenScope {
            target: Target::Group(Subject::Id(9)),
            grantee: Grantee::Group(9),
        };
        let resolved = ScopeResolver::resolve(&scope, &directory()).await.unwrap();
        assert_eq!(resolved.subject, "analytics");
        assert!(resolved.is_group);
        assert_eq!(resolved.grantee, Grantee::Group(9));
    }

    #[tokio::test]
    async fn test_unknown_id_fails() {
        let scope = TokenScope {
            target: Target::Database(Subject::Id(5)),
            grantee: Grantee::User(1),
        };
        let err = ScopeResolver::resolve(&scope, &NoDirectory).await.unwrap_err();
        assert!(matches!(err, TokenError::UnknownSubject { kind: "database", id: 5 }));
    }

    #[test]
    fn test_subject_json_shape() {
        let by_id: Subject = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(by_id, Subject::Id(7));
        let by_name: Subject = serde_json::from_str(r#"{"name": "7"}"#).unwrap();
        assert_eq!(by_name, Subject::Name("7".to_string()));
    }
}
