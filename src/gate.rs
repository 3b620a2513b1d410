//! Authorization gate: what the stored credential allows the console to show.
//!
//! Every predicate reads the store at call time. Nothing is cached and no
//! token is checked for validity; presence is all that counts.

use crate::session::{SessionStore, ROLE_KEY, TOKEN_KEY};

/// Role literal the backend uses for its `/admin/**` authority check.
pub const DEFAULT_ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    admin_role: String,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_ROLE)
    }
}

impl Gate {
    pub fn new(admin_role: &str) -> Self {
        Self {
            admin_role: admin_role.to_string(),
        }
    }

    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    pub fn is_authenticated(&self, store: &dyn SessionStore) -> bool {
        store.get(TOKEN_KEY).is_some_and(|t| !t.is_empty())
    }

    /// Exact match, no prefix stripping or case folding.
    pub fn is_admin(&self, store: &dyn SessionStore) -> bool {
        store
            .get(ROLE_KEY)
            .is_some_and(|role| role == self.admin_role)
    }

    pub fn admin_only(&self, store: &dyn SessionStore) -> bool {
        self.is_authenticated(store) && self.is_admin(store)
    }

    /// Evaluate all three predicates at once.
    pub fn snapshot(&self, store: &dyn SessionStore) -> Access {
        Access {
            authenticated: self.is_authenticated(store),
            admin: self.is_admin(store),
        }
    }
}

/// The gate's answers at one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    pub authenticated: bool,
    pub admin: bool,
}

impl Access {
    pub fn admin_only(&self) -> bool {
        self.authenticated && self.admin
    }
}
