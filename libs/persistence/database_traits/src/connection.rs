use std::sync::Arc;

/// Exposes the raw driver handle held by a scope or connection wrapper.
pub trait GetDatabaseConnect {
    type Connect;
    fn get_connect(&self) -> &Self::Connect;
}

impl<T> GetDatabaseConnect for Arc<T>
where
    T: GetDatabaseConnect,
{
    type Connect = T::Connect;

    fn get_connect(&self) -> &Self::Connect { (**self).get_connect() }
}

impl<T> GetDatabaseConnect for Box<T>
where
    T: GetDatabaseConnect,
{
    type Connect = T::Connect;

    fn get_connect(&self) -> &Self::Connect { (**self).get_connect() }
}
