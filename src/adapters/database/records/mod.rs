pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::ConversationRow;
pub use message::MessageRow;
pub use user::UserRow;
