// Accounts: role documents in the `users` collection linked to players
pub use handlers::{link_account, register};
pub use identity::{IdentityProvider, InMemoryIdentityProvider};
pub use models::{Account, Role};
pub use service::AccountService;
pub use types::{LinkAccountRequest, RegisterRequest};

mod handlers;
mod identity;
pub mod models;
mod service;
mod types;
