//! Chat administration SDK for the Paanj platform.
//!
//! Resource clients for users, conversations and messages on top of a
//! connected [`paanj_admin`] core:
//!
//! - CRUD calls are one HTTP request each, errors propagate unchanged
//! - `on_*` methods send a subscription and register a local listener
//!
//! # Example
//!
//! ```no_run
//! use paanj_admin::PaanjAdmin;
//! use paanj_chat_admin::{AdminChat, CreateUserData};
//!
//! # async fn example() -> paanj_chat_admin::Result<()> {
//! let admin = PaanjAdmin::builder().secret_key("sk_live_key").build()?;
//! admin.connect().await?;
//! let chat = AdminChat::new(admin.clone());
//!
//! let user = chat.users().create(&CreateUserData::new("a@b.com", "A")).await?;
//! let listener = chat
//!     .conversation("c1")
//!     .on_message(|message| println!("{}", message))?;
//!
//! let page = chat
//!     .conversations()
//!     .list(Default::default())
//!     .user_id(&user.user_id)
//!     .limit(10)
//!     .page(2)
//!     .send()
//!     .await?;
//! println!("{} conversations", page.len());
//!
//! listener.unsubscribe();
//! admin.disconnect();
//! # Ok(())
//! # }
//! ```

mod chat;
pub mod query;
mod resources;
mod subscriptions;
pub mod types;

pub use chat::{
    AdminChat, ChatOptions, DEFAULT_CONVERSATIONS_PATH, DEFAULT_USERS_PATH, UsersHandle,
};
pub use query::{ConversationListQuery, DEFAULT_PAGE_SIZE, UserListQuery};
pub use resources::{
    AdminUserContext, ConversationHandle, ConversationsResource, MessagesResource, UsersResource,
};
pub use types::{
    Conversation, ConversationFilters, CreateConversationData, CreateUserData, Message,
    Participant, SendMessageData, UpdateConversationData, UpdateUserData, User, UserFilters,
};

// Re-exported so callers need only this crate for the common types.
pub use paanj_admin::{Error, Result, Unsubscribe};
