use std::sync::Arc;

use tracing::info;

use crate::repository::{ModeStore, RepoResult};

/// Demo mode is on until someone turns it off.
pub const DEFAULT_DEMO_MODE: bool = true;

/// Demo/live switch over a single persisted flag. Last write wins.
#[derive(Clone)]
pub struct ModeSwitch {
    store: Arc<dyn ModeStore>,
    default_demo: bool,
}

impl ModeSwitch {
    pub fn new(store: Arc<dyn ModeStore>) -> Self {
        Self { store, default_demo: DEFAULT_DEMO_MODE }
    }

    pub fn with_default(mut self, default_demo: bool) -> Self {
        self.default_demo = default_demo;
        self
    }

    /// Current mode. When nothing is persisted yet, the default is written
    /// and returned, so the first read also initializes the flag.
    pub async fn is_demo_mode(&self) -> RepoResult<bool> {
        match self.store.load_mode().await? {
            Some(demo) => Ok(demo),
            None => {
                self.store.store_mode(self.default_demo).await?;
                info!("Mode flag initialized (demo={})", self.default_demo);
                Ok(self.default_demo)
            }
        }
    }

    /// Current mode without writing anything.
    pub async fn current_mode(&self) -> RepoResult<bool> {
        Ok(self.store.load_mode().await?.unwrap_or(self.default_demo))
    }

    /// Persist the default if the flag is absent. Returns the effective mode.
    pub async fn initialize(&self) -> RepoResult<bool> {
        self.is_demo_mode().await
    }

    pub async fn set(&self, demo: bool) -> RepoResult<()> {
        self.store.store_mode(demo).await?;
        info!("Mode switched (demo={})", demo);
        Ok(())
    }

    pub async fn enable(&self) -> RepoResult<()> {
        self.set(true).await
    }

    pub async fn disable(&self) -> RepoResult<()> {
        self.set(false).await
    }

    /// Flip the flag and return the new mode.
    pub async fn toggle(&self) -> RepoResult<bool> {
        let next = !self.current_mode().await?;
        self.set(next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CellStore {
        value: Mutex<Option<bool>>,
    }

    #[async_trait]
    impl ModeStore for CellStore {
        async fn load_mode(&self) -> RepoResult<Option<bool>> {
            Ok(*self.value.lock().await)
        }

        async fn store_mode(&self, demo: bool) -> RepoResult<()> {
            *self.value.lock().await = Some(demo);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_read_persists_default() {
        let store = Arc::new(CellStore::default());
        let switch = ModeSwitch::new(store.clone());

        assert!(switch.is_demo_mode().await.unwrap());
        assert_eq!(*store.value.lock().await, Some(true));
    }

    #[tokio::test]
    async fn test_current_mode_does_not_write() {
        let store = Arc::new(CellStore::default());
        let switch = ModeSwitch::new(store.clone());

        assert!(switch.current_mode().await.unwrap());
        assert_eq!(*store.value.lock().await, None);
    }

    #[tokio::test]
    async fn test_double_toggle_restores_mode() {
        let switch = ModeSwitch::new(Arc::new(CellStore::default()));
        let original = switch.is_demo_mode().await.unwrap();

        assert_eq!(switch.toggle().await.unwrap(), !original);
        assert_eq!(switch.toggle().await.unwrap(), original);
        assert_eq!(switch.is_demo_mode().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let switch = ModeSwitch::new(Arc::new(CellStore::default())).with_default(false);
        assert!(!switch.is_demo_mode().await.unwrap());

        switch.enable().await.unwrap();
        assert!(switch.is_demo_mode().await.unwrap());

        switch.disable().await.unwrap();
        assert!(!switch.current_mode().await.unwrap());
    }
}
