use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authorization client failed to initialize: {0}")]
    ClientInit(String),

    #[error("A sign-in is already in flight for this session")]
    SignInInProgress,

    #[error("Authorization client dropped the state listener without firing it")]
    ListenerDropped,

    #[error("Authorization client error: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
