use std::collections::HashMap;

use crate::ports::{Credential, CredentialProvider};

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn with(id: &str, token: &str) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(id.to_string(), token.to_string());
        Self { tokens }
    }
}

impl CredentialProvider for StaticCredentials {
    fn lookup(&self, id: &str) -> Option<Credential> {
        self.tokens.get(id).map(|token| Credential { id: id.to_string(), token: token.clone() })
    }
}
