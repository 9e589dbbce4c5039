//! The [`AdminChat`] facade.

use std::ops::Deref;
use std::sync::Arc;

use paanj_admin::AdminCore;

use crate::resources::{
    AdminUserContext, ConversationHandle, ConversationsResource, MessagesResource, UsersResource,
};
use crate::subscriptions::Subscriber;

/// Default user collection path.
pub const DEFAULT_USERS_PATH: &str = "/admin/users";
/// Default conversation collection path.
pub const DEFAULT_CONVERSATIONS_PATH: &str = "/admin/conversations";

/// Construction options for [`AdminChat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOptions {
    /// Base path of the user collection.
    pub users_path: String,
    /// Base path of the conversation collection.
    pub conversations_path: String,
    /// Send `admin.unsubscribe` when the last local listener of a
    /// subscription is removed. Off by default: unsubscribing is local only.
    pub release_server_subscriptions: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            users_path: DEFAULT_USERS_PATH.to_string(),
            conversations_path: DEFAULT_CONVERSATIONS_PATH.to_string(),
            release_server_subscriptions: false,
        }
    }
}

/// The users resource, plus per-blocker contexts over the same instance.
///
/// Derefs to [`UsersResource`], so `chat.users().get(id)` works directly.
#[derive(Clone)]
pub struct UsersHandle {
    resource: Arc<UsersResource>,
}

impl UsersHandle {
    /// Block/unblock on behalf of `blocker_id`.
    pub fn as_context(&self, blocker_id: impl Into<String>) -> AdminUserContext {
        AdminUserContext::new(blocker_id, Arc::clone(&self.resource))
    }

    /// The shared resource.
    pub fn resource(&self) -> &Arc<UsersResource> {
        &self.resource
    }
}

impl Deref for UsersHandle {
    type Target = UsersResource;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// Chat administration for the Paanj platform.
///
/// Built from an admin core that is already connected. The resources are
/// created once and share the core.
///
/// ```no_run
/// use paanj_admin::PaanjAdmin;
/// use paanj_chat_admin::AdminChat;
///
/// # async fn example() -> paanj_chat_admin::Result<()> {
/// let admin = PaanjAdmin::builder().secret_key("sk_live_key").build()?;
/// admin.connect().await?;
///
/// let chat = AdminChat::new(admin.clone());
/// let _listener = chat.messages().on_create(|msg| println!("New message: {}", msg))?;
///
/// let user = chat.users().get("user_123").await?;
/// chat.user("42").block("43").await?;
/// chat.conversation("c1").send("Welcome!", None).await?;
/// # let _ = user;
/// # Ok(())
/// # }
/// ```
pub struct AdminChat {
    admin: Arc<dyn AdminCore>,
    messages: MessagesResource,
    users: UsersHandle,
    conversations: ConversationsResource,
}

impl AdminChat {
    pub fn new<A: AdminCore + 'static>(admin: A) -> Self {
        Self::with_options(admin, ChatOptions::default())
    }

    pub fn with_options<A: AdminCore + 'static>(admin: A, options: ChatOptions) -> Self {
        Self::from_shared(Arc::new(admin), options)
    }

    /// Build over a core that is already shared.
    pub fn from_shared(admin: Arc<dyn AdminCore>, options: ChatOptions) -> Self {
        let subscriber = Subscriber::new(Arc::clone(&admin), options.release_server_subscriptions);
        tracing::debug!(
            users_path = %options.users_path,
            conversations_path = %options.conversations_path,
            "Chat admin ready"
        );

        Self {
            messages: MessagesResource::new(subscriber.clone()),
            users: UsersHandle {
                resource: Arc::new(UsersResource::new(
                    Arc::clone(&admin),
                    subscriber.clone(),
                    options.users_path,
                )),
            },
            conversations: ConversationsResource::new(
                Arc::clone(&admin),
                subscriber,
                options.conversations_path,
            ),
            admin,
        }
    }

    /// Message event streams.
    pub fn messages(&self) -> &MessagesResource {
        &self.messages
    }

    /// User management.
    pub fn users(&self) -> &UsersHandle {
        &self.users
    }

    /// Conversation management.
    pub fn conversations(&self) -> &ConversationsResource {
        &self.conversations
    }

    /// Shorthand for `conversations().conversation(id)`.
    pub fn conversation(&self, conversation_id: impl Into<String>) -> ConversationHandle {
        self.conversations.conversation(conversation_id)
    }

    /// Shorthand for `users().as_context(blocker_id)`.
    pub fn user(&self, blocker_id: impl Into<String>) -> AdminUserContext {
        self.users.as_context(blocker_id)
    }

    /// The underlying admin core.
    pub fn admin(&self) -> &Arc<dyn AdminCore> {
        &self.admin
    }
}
