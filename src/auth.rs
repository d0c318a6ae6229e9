use std::fmt;

/// Secret string sent to a backend. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// How a request proves who is asking.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    #[default]
    Anonymous,
    Bearer(Token),
    Basic { username: String, password: Token },
}

impl Credentials {
    /// Picks bearer over basic when both are configured.
    pub fn from_parts(
        token: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        match (token, username, password) {
            (Some(token), _, _) => Self::Bearer(Token::from(token)),
            (None, Some(username), Some(password)) => Self::Basic {
                username: username.to_owned(),
                password: Token::from(password),
            },
            _ => Self::Anonymous,
        }
    }

    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Bearer(token) => request.bearer_auth(token.as_str()),
            Self::Basic { username, password } => {
                request.basic_auth(username, Some(password.as_str()))
            }
        }
    }
}
