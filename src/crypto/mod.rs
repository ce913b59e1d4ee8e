pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Unrecognised password hash format")]
    MalformedHash,
}
