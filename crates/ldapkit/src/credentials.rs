//! Bind credentials and the providers that supply passwords.

use secrecy::{ExposeSecret, SecretString};

use ldapkit_core::{DirectoryConfig, Error};

use crate::Result;

/// Who to bind as.
#[derive(Debug)]
pub enum Credentials {
    /// Anonymous simple bind.
    Anonymous,
    /// Simple bind with a DN and password.
    Simple {
        /// Bind DN.
        bind_dn: String,
        /// Bind password.
        password: SecretString,
    },
}

impl Credentials {
    /// Simple-bind credentials.
    #[must_use]
    pub fn simple(bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Simple {
            bind_dn: bind_dn.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The bind identity, empty for anonymous binds.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::Simple { bind_dn, .. } => bind_dn,
        }
    }
}

/// Supplies the password for a bind identity.
pub trait CredentialProvider: Send + Sync {
    /// Returns the password to bind `bind_dn` with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when no password can be obtained.
    fn password(&self, bind_dn: &str) -> Result<SecretString>;
}

/// A fixed password.
#[derive(Debug)]
pub struct StaticCredentials {
    password: SecretString,
}

impl StaticCredentials {
    /// Wraps a known password.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: SecretString::from(password.into()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn password(&self, _bind_dn: &str) -> Result<SecretString> {
        Ok(SecretString::from(self.password.expose_secret().to_string()))
    }
}

/// Reads the password from the controlling terminal.
#[derive(Debug, Default)]
pub struct PromptCredentials;

impl CredentialProvider for PromptCredentials {
    fn password(&self, bind_dn: &str) -> Result<SecretString> {
        rpassword::prompt_password(format!("Password for {bind_dn}: "))
            .map(SecretString::from)
            .map_err(|err| Error::Authentication {
                identity: bind_dn.to_string(),
                message: format!("failed to read password: {err}"),
            })
    }
}

/// Resolves the credentials a configuration asks for.
///
/// No `binddn` means an anonymous bind. A `binddn` with a `bindpw` uses that password;
/// without one, `fallback` is asked.
///
/// # Errors
///
/// Propagates the fallback provider's failure.
pub fn resolve_credentials(
    config: &DirectoryConfig,
    fallback: &dyn CredentialProvider,
) -> Result<Credentials> {
    let Some(bind_dn) = config.bind_dn.clone() else {
        return Ok(Credentials::Anonymous);
    };

    let password = match &config.bind_password {
        Some(password) => SecretString::from(password.expose_secret().to_string()),
        None => fallback.password(&bind_dn)?,
    };
    Ok(Credentials::Simple { bind_dn, password })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    impl CredentialProvider for Refusing {
        fn password(&self, bind_dn: &str) -> Result<SecretString> {
            Err(Error::Authentication {
                identity: bind_dn.to_string(),
                message: "no terminal".to_string(),
            })
        }
    }

    fn password_of(credentials: &Credentials) -> Option<String> {
        match credentials {
            Credentials::Anonymous => None,
            Credentials::Simple { password, .. } => Some(password.expose_secret().to_string()),
        }
    }

    #[test]
    fn anonymous_without_bind_dn() {
        let config = DirectoryConfig::new("ldap://localhost").unwrap();
        let credentials = resolve_credentials(&config, &Refusing).unwrap();
        assert!(matches!(credentials, Credentials::Anonymous));
        assert_eq!(credentials.identity(), "");
    }

    #[test]
    fn configured_password_wins() {
        let config = DirectoryConfig::new("ldap://localhost")
            .unwrap()
            .with_bind("cn=Manager,dc=example,dc=org", "password");
        let credentials = resolve_credentials(&config, &Refusing).unwrap();
        assert_eq!(credentials.identity(), "cn=Manager,dc=example,dc=org");
        assert_eq!(password_of(&credentials).as_deref(), Some("password"));
    }

    #[test]
    fn missing_password_asks_the_provider() {
        let config = DirectoryConfig::new("ldap://localhost")
            .unwrap()
            .with_bind_dn("cn=Manager,dc=example,dc=org");

        let credentials = resolve_credentials(&config, &StaticCredentials::new("typed")).unwrap();
        assert_eq!(password_of(&credentials).as_deref(), Some("typed"));

        let err = resolve_credentials(&config, &Refusing).unwrap_err();
        assert!(err.is_bind_failure());
    }
}
