use serde::{Deserialize, Serialize};

use crate::domain::password::PasswordAlgorithm;

/// Configuration for the user_accounts module (`modules.user_accounts`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAccountsConfig {
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub password_algorithm: PasswordAlgorithm,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// Cache the last issued token on the user row at login.
    #[serde(default)]
    pub persist_access_token: bool,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_password_min_len")]
    pub password_min_len: usize,
    #[serde(default = "default_password_max_len")]
    pub password_max_len: usize,
}

impl Default for UserAccountsConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            password_algorithm: PasswordAlgorithm::default(),
            bcrypt_cost: default_bcrypt_cost(),
            persist_access_token: false,
            max_name_length: default_max_name_length(),
            password_min_len: default_password_min_len(),
            password_max_len: default_password_max_len(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_max_name_length() -> usize {
    100
}

fn default_password_min_len() -> usize {
    8
}

fn default_password_max_len() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg: UserAccountsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.token_ttl_secs, 3600);
        assert_eq!(cfg.password_algorithm, PasswordAlgorithm::Argon2);
        assert_eq!(cfg.bcrypt_cost, 10);
        assert!(!cfg.persist_access_token);
        assert_eq!((cfg.password_min_len, cfg.password_max_len), (8, 20));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = serde_json::from_str::<UserAccountsConfig>(r#"{"jwt_secret":"x"}"#);
        assert!(res.is_err());
    }
}
