//! Identifiers shared across the relay

use uuid::Uuid;

/// Opaque handle for one connection
///
/// Outlives name changes during the claim loop and keys `release`, so a
/// session can only ever deregister itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form keeps log lines readable
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_session_id_display_is_short_prefix() {
        let id = SessionId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 8);
        assert!(id.0.simple().to_string().starts_with(&shown));
    }
}
