//! Session provider seam.

use parking_lot::RwLock;

/// Supplies the signed-in user.
///
/// Authentication itself happens elsewhere; the engine only needs a stable
/// user id to address remote collections.
pub trait SessionProvider: Send + Sync {
    /// Returns the signed-in user's id, if any.
    fn current_user(&self) -> Option<String>;
}

/// A session held in memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    user_id: RwLock<Option<String>>,
}

impl MemorySession {
    /// Creates a session signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    /// Creates a session with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signs in as `user_id`.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self.user_id.write() = Some(user_id.into());
    }

    /// Signs out.
    pub fn sign_out(&self) {
        *self.user_id.write() = None;
    }
}

impl SessionProvider for MemorySession {
    fn current_user(&self) -> Option<String> {
        self.user_id.read().clone().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let session = MemorySession::signed_out();
        assert_eq!(session.current_user(), None);

        session.sign_in("alice");
        assert_eq!(session.current_user().as_deref(), Some("alice"));

        session.sign_out();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn empty_id_is_no_user() {
        assert_eq!(MemorySession::signed_in("").current_user(), None);
    }
}
