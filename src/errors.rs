use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthError {
    #[error("principal not found")]
    #[diagnostic(code(perigee::principal_not_found))]
    PrincipalNotFound,

    #[error("grant not found")]
    #[diagnostic(code(perigee::grant_not_found))]
    GrantNotFound,

    #[error("username `{0}` is already taken")]
    #[diagnostic(code(perigee::username_taken))]
    UsernameTaken(String),

    #[error("credentials do not match")]
    #[diagnostic(code(perigee::invalid_credential))]
    InvalidCredential,

    #[error("password rejected by policy: {0}")]
    #[diagnostic(code(perigee::password_policy))]
    PasswordPolicy(String),

    #[error("permission denied")]
    #[diagnostic(code(perigee::permission_denied))]
    PermissionDenied,

    #[error("invalid token: {0}")]
    #[diagnostic(code(perigee::invalid_token))]
    InvalidToken(String),

    #[error("invalid grant: {0}")]
    #[diagnostic(code(perigee::invalid_grant))]
    InvalidGrant(String),

    #[error("unknown identity provider `{0}`")]
    #[diagnostic(code(perigee::unknown_provider))]
    UnknownProvider(String),

    #[error("identity provider rejected the exchange: {0}")]
    #[diagnostic(code(perigee::provider_exchange))]
    ProviderExchange(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(perigee::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(perigee::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(perigee::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(perigee::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("JOSE error: {0}")]
    #[diagnostic(code(perigee::jose))]
    Jose(String),

    #[error("{0}")]
    #[diagnostic(code(perigee::other))]
    Other(String),
}

impl From<josekit::JoseError> for AuthError {
    fn from(value: josekit::JoseError) -> Self {
        AuthError::Jose(value.to_string())
    }
}
