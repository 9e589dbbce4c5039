//! Resource clients.

mod conversations;
mod messages;
mod user_context;
mod users;

pub use conversations::{ConversationHandle, ConversationsResource};
pub use messages::MessagesResource;
pub use user_context::AdminUserContext;
pub use users::UsersResource;

use paanj_admin::{Error, Result};

/// `base/<id>` with `id` percent-encoded as a single path segment.
///
/// Empty and dot-only ids are rejected: URL resolution would treat them
/// as navigation rather than as an id.
pub(crate) fn item_path(base: &str, id: &str) -> Result<String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(Error::InvalidArgument(format!("invalid resource id '{}'", id)));
    }
    Ok(format!("{}/{}", base, urlencoding::encode(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_path_encodes_segment() {
        assert_eq!(item_path("/admin/users", "u1").unwrap(), "/admin/users/u1");
        assert_eq!(
            item_path("/admin/users", "x?force=1").unwrap(),
            "/admin/users/x%3Fforce%3D1"
        );
        assert_eq!(item_path("/admin/users", "a/b").unwrap(), "/admin/users/a%2Fb");
        assert_eq!(
            item_path("/admin/users", "user@example.com").unwrap(),
            "/admin/users/user%40example.com"
        );
    }

    #[test]
    fn test_item_path_rejects_navigation_ids() {
        for id in ["", ".", ".."] {
            assert!(matches!(
                item_path("/admin/users", id),
                Err(Error::InvalidArgument(_))
            ));
        }
    }
}
