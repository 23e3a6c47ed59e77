//! Domain entities - the core business objects.

mod access;
mod post;

pub use access::{ADMIN_ROLE, Access, AccessPolicy, Caller, Operation, Surface};
pub use post::{Post, PostChanges, PostDraft, PostInput};
