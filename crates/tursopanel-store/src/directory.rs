//! Id-to-name lookups for token scope resolution.

use crate::Store;
use async_trait::async_trait;
use tursopanel_token::{Directory, TokenError};

#[async_trait]
impl Directory for Store {
    /// Only active databases resolve; archived ones are treated as unknown.
    async fn database_name(&self, id: u64) -> Result<Option<String>, TokenError> {
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };
        let record = self
            .find_database(id)
            .await
            .map_err(|e| TokenError::Lookup(e.to_string()))?;
        Ok(record.filter(|db| !db.is_archived()).map(|db| db.name))
    }

    async fn group_name(&self, id: u64) -> Result<Option<String>, TokenError> {
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };
        let record = self
            .find_group(id)
            .await
            .map_err(|e| TokenError::Lookup(e.to_string()))?;
        Ok(record.map(|group| group.name))
    }
}
