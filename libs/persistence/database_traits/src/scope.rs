use std::{error::Error as StdError, sync::Arc};

use async_trait::async_trait;

/// Produces a fresh, exclusively owned data context for one logical
/// operation.
///
/// The returned scope is released when it is dropped. Implementations
/// must not hand the same underlying handle to two live scopes.
#[async_trait]
pub trait GetDatabaseScope: Send + Sync {
    type Scope: Send;
    type Error: StdError + Send + Sync + 'static;

    async fn get_scope(&self) -> Result<Self::Scope, Self::Error>;
}

#[async_trait]
impl<T> GetDatabaseScope for Arc<T>
where
    T: GetDatabaseScope,
{
    type Error = T::Error;
    type Scope = T::Scope;

    async fn get_scope(&self) -> Result<Self::Scope, Self::Error> {
        (**self).get_scope().await
    }
}

#[async_trait]
impl<T> GetDatabaseScope for &T
where
    T: GetDatabaseScope,
{
    type Error = T::Error;
    type Scope = T::Scope;

    async fn get_scope(&self) -> Result<Self::Scope, Self::Error> {
        (**self).get_scope().await
    }
}
