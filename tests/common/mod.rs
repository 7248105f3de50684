// Common test utilities and helpers
#![allow(dead_code)]

use datastone::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl User {
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            age,
            tags: Vec::new(),
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Create a connection over a throwaway database
pub fn temp_connection() -> SledConnection {
    init_logging();
    SledConnection::new(SledContext::temporary().expect("temporary sled database"))
}

/// Store `users` in order and return their identifiers
pub fn seed(storage: &SledStorage<'_>, users: &[User]) -> Vec<Identifier> {
    users
        .iter()
        .map(|u| storage.put(u).expect("put user"))
        .collect()
}
