pub mod client;
pub mod error;
pub mod model;

pub use client::UserAccountsApi;
pub use error::UserAccountsError;
pub use model::{NewUser, Role, User, UserPatch};
