use secrecy::SecretString;

/// Upstream password with secrecy protection (zeroized on drop, redacted in Debug).
#[derive(Clone)]
pub struct Credential(pub SecretString);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Where the upstream lives and how to authenticate with it.
#[derive(Clone, Debug)]
pub struct UpstreamTarget {
    pub address: String,
    pub credential: Credential,
}

impl UpstreamTarget {
    pub fn new(address: impl Into<String>, credential: Credential) -> Self {
        Self {
            address: address.into(),
            credential,
        }
    }
}
