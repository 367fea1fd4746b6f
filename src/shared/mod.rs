pub mod conversation_locks;

pub use conversation_locks::ConversationLocks;
