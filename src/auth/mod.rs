pub mod credentials;

pub use credentials::{BcryptCredentials, CredentialService};
