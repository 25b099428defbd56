pub mod oauth1;

pub use oauth1::{OAuthCredentials, OAuthSigner};
