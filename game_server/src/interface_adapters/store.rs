// In-memory account store. Accounts live for the lifetime of the process.

use crate::domain::Account;
use crate::domain::ports::AccountStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, address: &str) -> Result<Option<Account>, String> {
        Ok(self.accounts.read().await.get(address).cloned())
    }

    async fn save(&self, account: &Account, expected_version: Option<u64>) -> Result<bool, String> {
        let mut accounts = self.accounts.write().await;
        let current = accounts.get(&account.address).map(|stored| stored.version);
        if current != expected_version {
            return Ok(false);
        }
        accounts.insert(account.address.clone(), account.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryAccountStore::new();
        let mut account = Account::new("0xabc");
        account.version = 1;

        assert_eq!(store.save(&account, None).await, Ok(true));
        assert_eq!(store.save(&account, None).await, Ok(false));

        account.version = 2;
        account.balance = 10;
        assert_eq!(store.save(&account, Some(1)).await, Ok(true));
        assert_eq!(store.get("0xabc").await.map(|a| a.map(|a| a.balance)), Ok(Some(10)));
    }
}
