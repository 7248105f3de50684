use super::storage::Storage;

/// Holds a handle to the backend and hands out collection-bound [`Storage`]s.
pub trait Connection {
    /// Backend execution context wrapped by the connection.
    type Context;

    type Storage<'c>: Storage
    where
        Self: 'c;

    /// Replace the wrapped context. The caller is responsible for its validity.
    fn set_context(&mut self, context: Self::Context);

    fn context(&self) -> &Self::Context;

    /// Bind a [`Storage`] to the collection `name`.
    ///
    /// This never touches the backend; a collection that has never been
    /// written to is simply empty.
    fn storage<'c>(&'c self, name: &str) -> Self::Storage<'c>;
}
