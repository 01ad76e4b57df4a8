use secrecy::SecretString;

/// Arguments shared by every subcommand. Credentials are optional; commands
/// that need a session sign in with them first and fail with a clear message
/// when they are absent.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub totp_code: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(api_url: String, timeout_seconds: u64) -> Self {
        Self {
            api_url,
            timeout_seconds,
            email: None,
            password: None,
            totp_code: None,
        }
    }
}
