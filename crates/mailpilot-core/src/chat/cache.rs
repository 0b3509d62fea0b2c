use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::mailbox::EmailSummary;

/// A listed email pinned in memory so later commands can refer to it by
/// position. `draft` is filled in by a prepare-reply command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEmail {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub body: String,
    pub draft: Option<String>,
}

impl From<EmailSummary> for CachedEmail {
    fn from(email: EmailSummary) -> Self {
        Self {
            id: email.id,
            subject: email.subject,
            from: email.from,
            body: email.body,
            draft: None,
        }
    }
}

/// Per-session email windows. Each list command replaces the session's window
/// wholesale, so positional references are only valid until the next list.
/// One session's window never affects another's.
#[derive(Debug, Default)]
pub struct EmailCache {
    sessions: Mutex<HashMap<String, Vec<CachedEmail>>>,
}

impl EmailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, session_id: &str, emails: Vec<CachedEmail>) {
        let mut guard = self.sessions.lock().await;
        guard.insert(session_id.to_string(), emails);
    }

    /// Zero-based lookup; callers translate from the 1-based command grammar.
    pub async fn get(&self, session_id: &str, index: usize) -> Option<CachedEmail> {
        let guard = self.sessions.lock().await;
        guard.get(session_id).and_then(|w| w.get(index)).cloned()
    }

    /// Stores a draft on one entry. Returns false when the entry is gone,
    /// which can happen if a concurrent list replaced the window.
    pub async fn set_draft(&self, session_id: &str, index: usize, draft: String) -> bool {
        let mut guard = self.sessions.lock().await;
        match guard.get_mut(session_id).and_then(|w| w.get_mut(index)) {
            Some(entry) => {
                entry.draft = Some(draft);
                true
            }
            None => false,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str) -> CachedEmail {
        CachedEmail {
            id: id.to_string(),
            subject: format!("subject {id}"),
            from: format!("{id}@example.com"),
            body: format!("body {id}"),
            draft: None,
        }
    }

    #[tokio::test]
    async fn replace_is_wholesale() {
        let cache = EmailCache::new();
        cache.replace("s1", vec![email("a"), email("b")]).await;
        cache.replace("s1", vec![email("c")]).await;

        assert_eq!(cache.get("s1", 0).await.unwrap().id, "c");
        assert!(
            cache.get("s1", 1).await.is_none(),
            "old entries do not survive a replace"
        );
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let cache = EmailCache::new();
        cache.replace("s1", vec![email("a")]).await;
        cache.replace("s2", vec![email("b"), email("c")]).await;

        assert_eq!(cache.get("s1", 0).await.unwrap().id, "a");
        assert_eq!(cache.get("s2", 0).await.unwrap().id, "b");
        cache.replace("s1", vec![]).await;
        assert_eq!(
            cache.get("s2", 1).await.unwrap().id,
            "c",
            "clearing one session leaves the other intact"
        );
    }

    #[tokio::test]
    async fn set_draft_touches_one_entry() {
        let cache = EmailCache::new();
        cache.replace("s1", vec![email("a"), email("b")]).await;

        assert!(cache.set_draft("s1", 1, "draft text".into()).await);
        assert_eq!(cache.get("s1", 0).await.unwrap().draft, None);
        assert_eq!(
            cache.get("s1", 1).await.unwrap().draft.as_deref(),
            Some("draft text")
        );
    }

    #[tokio::test]
    async fn set_draft_on_missing_entry_is_noop() {
        let cache = EmailCache::new();
        assert!(!cache.set_draft("s1", 0, "draft".into()).await);
        cache.replace("s1", vec![email("a")]).await;
        assert!(!cache.set_draft("s1", 5, "draft".into()).await);
    }
}
