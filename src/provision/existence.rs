use tracing::debug;

use super::catalog::{RESOURCE_EXISTS_SQL, SUB_RESOURCE_EXISTS_SQL};
use crate::error::StatvaultError;
use crate::store::{DataStore, Identifier, Value, execute_once};

/// Read-only existence queries against the server catalog.
///
/// An empty result means "does not exist"; any store failure is propagated.
#[derive(Clone, Copy)]
pub struct ExistenceChecker<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ExistenceChecker<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn resource_exists(&self, name: &Identifier) -> Result<bool, StatvaultError> {
        let rows = execute_once(
            self.store,
            None,
            RESOURCE_EXISTS_SQL,
            &[Value::from(name.as_str())],
        )
        .await
        .map_err(|e| StatvaultError::from_store(e, format!("checking database `{name}`")))?
        .into_rows();

        let exists = !rows.is_empty();
        debug!(database = %name, exists, "database existence checked");
        Ok(exists)
    }

    pub async fn sub_resource_exists(
        &self,
        resource: &Identifier,
        sub: &Identifier,
    ) -> Result<bool, StatvaultError> {
        let rows = execute_once(
            self.store,
            None,
            SUB_RESOURCE_EXISTS_SQL,
            &[Value::from(resource.as_str()), Value::from(sub.as_str())],
        )
        .await
        .map_err(|e| {
            StatvaultError::from_store(e, format!("checking table `{sub}` in `{resource}`"))
        })?
        .into_rows();

        let exists = !rows.is_empty();
        debug!(database = %resource, table = %sub, exists, "table existence checked");
        Ok(exists)
    }
}
