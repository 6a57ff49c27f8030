use std::fmt;

/// The single credential that authorizes create and delete.
///
/// Compared by exact string equality. There is no per-user identity,
/// rate limiting or expiry.
#[derive(Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn verify(&self, supplied: &str) -> bool {
        self.secret == supplied
    }
}

// Never print the secret itself.
impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}
