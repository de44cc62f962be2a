use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub session_secret: SecretString,
    pub frontend_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(session_secret: SecretString, frontend_url: String) -> Self {
        Self {
            session_secret,
            frontend_url,
        }
    }
}
