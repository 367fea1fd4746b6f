use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Per-conversation serialization for the read-tag / classify / merge /
/// write-tag sequence.
///
/// Two messages for the same conversation arriving close together must not
/// interleave their check-then-act on the current tag; messages for
/// different conversations never contend.
#[derive(Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock guarding one conversation.
    pub fn lock_for(&self, conversation_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("conversation lock registry poisoned");
        locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_conversation_shares_a_lock() {
        let locks = ConversationLocks::new();
        let a = locks.lock_for("conv-1");
        let b = locks.lock_for("conv-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_conversations_do_not_contend() {
        let locks = ConversationLocks::new();
        let a = locks.lock_for("conv-1");
        let b = locks.lock_for("conv-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_serializes_critical_sections() {
        let locks = ConversationLocks::new();
        let counter = Arc::new(Mutex::new(0usize));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let lock = locks.lock_for("conv-1");
                let _guard = lock.lock().await;
                let value = *counter.lock().unwrap();
                tokio::task::yield_now().await;
                *counter.lock().unwrap() = value + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*counter.lock().unwrap(), 8);
    }
}
