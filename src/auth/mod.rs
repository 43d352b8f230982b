// Identity, credentials, and the session cookie machinery.

pub mod extract;
pub mod password;
pub mod session;

pub use extract::{AdminUser, CurrentUser};
pub use password::{hash_password, verify_password};
pub use session::{Flash, clear_session, establish_session, set_flash, take_flash};

/// The designated administrator: the user whose row id equals this constant.
/// Sole authority for post create/edit/delete.
pub const ADMIN_USER_ID: i64 = 1;
