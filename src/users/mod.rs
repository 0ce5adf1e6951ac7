pub mod dto;
pub mod errors;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod signing;
pub mod token;
pub mod validation;

pub use dto::{LoginRequest, SignupRequest};
pub use errors::{StoreError, UserError};
pub use memory::InMemoryUserStore;
pub use repo::{PgUserStore, UserStore};
pub use repo_types::Account;
pub use services::UserService;
