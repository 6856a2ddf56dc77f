use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// The single configured staff account.
#[derive(Clone)]
pub struct AdminCredentials {
    email: String,
    password_digest: [u8; 32],
}

impl AdminCredentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_ascii_lowercase(),
            password_digest: digest(password),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Compares both fields without short-circuiting on the email.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        let email_ok = digest(&email).ct_eq(&digest(&self.email));
        let password_ok = digest(password).ct_eq(&self.password_digest);
        bool::from(email_ok & password_ok)
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
