//! Single-holder workspace locking.

use std::sync::Arc;

use tfstate_meta::{LockAttempt, LockInfo, LockState, MetadataStore, Release};
use tfstate_types::{LockToken, WorkspaceName};

use crate::error::{EngineError, EngineResult};

/// Result of an unlock request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockOutcome {
    Released,
    /// The workspace exists but is not locked with the supplied token.
    Refused,
    NotFound,
}

/// Enforces at most one lock holder per workspace.
///
/// Every decision is delegated to a single atomic call on the metadata
/// store; this type never reads and then writes.
#[derive(Clone)]
pub struct LockManager {
    meta: Arc<dyn MetadataStore>,
}

impl LockManager {
    pub fn new(meta: Arc<dyn MetadataStore>) -> Self {
        Self { meta }
    }

    /// Acquire the lock, creating the workspace if needed.
    ///
    /// Returns `false` if anyone holds it already, including the same token.
    pub async fn try_lock(&self, name: &WorkspaceName, lock: &LockInfo) -> EngineResult<bool> {
        match self.meta.try_lock(name, lock).await? {
            LockAttempt::Acquired(_) => {
                tracing::info!(workspace = %name, holder = %lock.holder, "lock acquired");
                Ok(true)
            }
            LockAttempt::Held(current) => {
                tracing::info!(
                    workspace = %name,
                    requested_by = %lock.holder,
                    held_by = current.lock.info().map(|i| i.holder.as_str()).unwrap_or("unknown"),
                    "lock denied"
                );
                Ok(false)
            }
        }
    }

    /// Like [`try_lock`](Self::try_lock), failing with `AlreadyLocked`.
    pub async fn lock(&self, name: &WorkspaceName, lock: &LockInfo) -> EngineResult<()> {
        match self.meta.try_lock(name, lock).await? {
            LockAttempt::Acquired(_) => {
                tracing::info!(workspace = %name, holder = %lock.holder, "lock acquired");
                Ok(())
            }
            LockAttempt::Held(current) => {
                let holder = current
                    .lock
                    .info()
                    .map(|info| info.holder.clone())
                    .unwrap_or_else(|| "unknown".into());
                tracing::info!(workspace = %name, requested_by = %lock.holder, held_by = %holder, "lock denied");
                Err(EngineError::AlreadyLocked {
                    workspace: name.to_string(),
                    holder,
                })
            }
        }
    }

    pub async fn unlock(
        &self,
        name: &WorkspaceName,
        token: &LockToken,
    ) -> EngineResult<UnlockOutcome> {
        let outcome = match self.meta.release_lock(name, token).await? {
            Release::Released(_) => {
                tracing::info!(workspace = %name, "lock released");
                UnlockOutcome::Released
            }
            Release::Refused => {
                tracing::warn!(workspace = %name, "unlock refused: token does not match");
                UnlockOutcome::Refused
            }
            Release::NotFound => {
                tracing::warn!(workspace = %name, "unlock of unknown workspace");
                UnlockOutcome::NotFound
            }
        };
        Ok(outcome)
    }

    /// Like [`unlock`](Self::unlock), mapping refusals to errors.
    pub async fn release(&self, name: &WorkspaceName, token: &LockToken) -> EngineResult<()> {
        match self.unlock(name, token).await? {
            UnlockOutcome::Released => Ok(()),
            UnlockOutcome::Refused => Err(EngineError::InvalidLockToken(name.to_string())),
            UnlockOutcome::NotFound => Err(EngineError::LockNotFound(name.to_string())),
        }
    }

    /// Current lock state, or `None` if the workspace does not exist.
    pub async fn status(&self, name: &WorkspaceName) -> EngineResult<Option<LockState>> {
        Ok(self.meta.workspace(name).await?.map(|ws| ws.lock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tfstate_meta::InMemoryMetadataStore;

    fn manager() -> LockManager {
        LockManager::new(Arc::new(InMemoryMetadataStore::new()))
    }

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    fn token(s: &str) -> LockToken {
        LockToken::new(s).unwrap()
    }

    fn info(t: &str, holder: &str) -> LockInfo {
        LockInfo::new(token(t), holder, Utc::now())
    }

    #[tokio::test]
    async fn first_lock_creates_workspace_locked() {
        let locks = manager();
        assert_eq!(locks.status(&name("infra")).await.unwrap(), None);

        locks.lock(&name("infra"), &info("abc", "alice")).await.unwrap();

        let state = locks.status(&name("infra")).await.unwrap().unwrap();
        assert!(state.is_held_by(&token("abc")));
        assert_eq!(state.info().unwrap().holder, "alice");
    }

    #[tokio::test]
    async fn second_lock_is_already_locked() {
        let locks = manager();
        locks.lock(&name("infra"), &info("abc", "alice")).await.unwrap();

        let err = locks
            .lock(&name("infra"), &info("def", "bob"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::AlreadyLocked {
                workspace: "infra".into(),
                holder: "alice".into()
            }
        );
    }

    #[tokio::test]
    async fn locking_is_not_reentrant() {
        let locks = manager();
        assert!(locks.try_lock(&name("w"), &info("abc", "alice")).await.unwrap());
        assert!(!locks.try_lock(&name("w"), &info("abc", "alice")).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_token_keeps_the_lock() {
        let locks = manager();
        locks.lock(&name("infra"), &info("abc", "alice")).await.unwrap();

        let err = locks
            .release(&name("infra"), &token("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidLockToken("infra".into()));

        let state = locks.status(&name("infra")).await.unwrap().unwrap();
        assert!(state.is_held_by(&token("abc")));
    }

    #[tokio::test]
    async fn unlock_then_relock_with_new_token() {
        let locks = manager();
        locks.lock(&name("infra"), &info("abc", "alice")).await.unwrap();
        locks.release(&name("infra"), &token("abc")).await.unwrap();

        assert_eq!(
            locks.status(&name("infra")).await.unwrap(),
            Some(LockState::Unlocked)
        );
        locks.lock(&name("infra"), &info("def", "bob")).await.unwrap();
    }

    #[tokio::test]
    async fn unlock_missing_workspace_is_lock_not_found() {
        let locks = manager();
        assert_eq!(
            locks.unlock(&name("missing-workspace"), &token("x")).await.unwrap(),
            UnlockOutcome::NotFound
        );
        assert_eq!(
            locks
                .release(&name("missing-workspace"), &token("x"))
                .await
                .unwrap_err(),
            EngineError::LockNotFound("missing-workspace".into())
        );
    }

    #[tokio::test]
    async fn unlock_of_unlocked_workspace_is_refused() {
        let locks = manager();
        locks.lock(&name("w"), &info("abc", "alice")).await.unwrap();
        locks.release(&name("w"), &token("abc")).await.unwrap();

        assert_eq!(
            locks.unlock(&name("w"), &token("abc")).await.unwrap(),
            UnlockOutcome::Refused
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_locks_have_exactly_one_winner() {
        let locks = manager();
        let mut handles = Vec::new();
        for i in 0..16 {
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                locks
                    .try_lock(&name("contended"), &info(&format!("t{i}"), &format!("h{i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
