//! Account and inventory services over a `Store`.

mod account;
mod inventory;
mod password;
mod validation;
pub use account::AccountService;
pub use inventory::{InventoryService, DATA_NOT_FOUND};
pub use password::{hash_password, verify_password};
pub use validation::{is_cent_multiple, RequestValidator, CREDENTIALS_MESSAGE, NUL_MESSAGE};
