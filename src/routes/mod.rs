// Routing segregation: anonymous-readable endpoints vs. admin-only
// post management. Authentication for commenting is enforced inside the
// comment handler itself, because the same URL serves anonymous readers.

pub mod admin;
pub mod public;
