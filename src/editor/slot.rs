use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

/// Single-editor guard. At most one bridge may hold a slot at a time.
///
/// [`EditorSlot::global`] is the process-wide instance; tests build their own.
#[derive(Debug, Clone, Default)]
pub struct EditorSlot {
    busy: Arc<AtomicBool>,
}

impl EditorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> EditorSlot {
        static GLOBAL: OnceLock<EditorSlot> = OnceLock::new();
        GLOBAL.get_or_init(EditorSlot::new).clone()
    }

    /// Claim the slot. `false` if someone else holds it.
    pub fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_holder() {
        let slot = EditorSlot::new();
        let other = slot.clone();
        assert!(slot.try_acquire());
        assert!(!other.try_acquire());
        assert!(other.is_busy());
        slot.release();
        assert!(other.try_acquire());
    }

    #[test]
    fn global_is_shared() {
        let a = EditorSlot::global();
        let b = EditorSlot::global();
        assert!(Arc::ptr_eq(&a.busy, &b.busy));
    }
}
