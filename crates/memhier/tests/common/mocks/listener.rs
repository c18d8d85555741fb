use memhier_core::prefetch::{AccessNotice, CacheListener, PrefetchRequest};
use mockall::mock;

mock! {
    pub Listener {}
    impl CacheListener for Listener {
        fn notify(&mut self, notice: &AccessNotice) -> Option<PrefetchRequest>;
    }
}
