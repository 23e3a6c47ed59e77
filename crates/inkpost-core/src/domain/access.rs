//! Access rules for the public and admin route surfaces.

/// Role carried by tokens issued to the blog administrator.
pub const ADMIN_ROLE: &str = "admin";

/// Which route family served the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Public,
    Admin,
}

/// What the request does to the post collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Who is calling, as far as the presented credentials tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated { subject: String, roles: Vec<String> },
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        match self {
            Caller::Anonymous => false,
            Caller::Authenticated { roles, .. } => roles.iter().any(|r| r == ADMIN_ROLE),
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No usable credentials were presented.
    NeedsAuthentication,
    /// Credentials were presented but lack the admin role.
    Forbidden,
}

/// Single authorization predicate shared by every post route.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    /// Require an admin caller for everything on the admin surface.
    pub protect_admin: bool,
    /// Require an admin caller for writes on the public surface.
    pub protect_public_writes: bool,
}

impl AccessPolicy {
    /// Policy that lets everyone do everything.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn check(&self, surface: Surface, operation: Operation, caller: &Caller) -> Access {
        let needs_admin = match (surface, operation) {
            (Surface::Admin, _) => self.protect_admin,
            (Surface::Public, Operation::Write) => self.protect_public_writes,
            (Surface::Public, Operation::Read) => false,
        };

        if !needs_admin || caller.is_admin() {
            Access::Granted
        } else if *caller == Caller::Anonymous {
            Access::NeedsAuthentication
        } else {
            Access::Forbidden
        }
    }
}
