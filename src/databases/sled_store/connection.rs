use super::context::SledContext;
use super::storage::SledStorage;
use crate::traits::Connection;

/// [`Connection`] over a [`SledContext`].
#[derive(Debug, Clone)]
pub struct SledConnection {
    context: SledContext,
}

impl SledConnection {
    pub fn new(context: SledContext) -> Self {
        Self { context }
    }
}

impl Connection for SledConnection {
    type Context = SledContext;

    type Storage<'c>
        = SledStorage<'c>
    where
        Self: 'c;

    fn set_context(&mut self, context: SledContext) {
        self.context = context;
    }

    fn context(&self) -> &SledContext {
        &self.context
    }

    fn storage<'c>(&'c self, name: &str) -> SledStorage<'c> {
        SledStorage::new(name, self)
    }
}
