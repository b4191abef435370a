use core::cell::Cell;
use core::marker::PhantomData;

thread_local! {
    static NO_MIDDLEWARE: Cell<bool> = const { Cell::new(false) };
}

/// Returns `true` while the current thread is inside a base write or read.
///
/// In that state [`ContractResolver::resolve`](crate::ContractResolver::resolve)
/// returns plain contracts, so the delegation to the underlying serializer does
/// not run the middleware chain again.
#[inline]
pub fn middleware_suppressed() -> bool {
    NO_MIDDLEWARE.with(Cell::get)
}

/// Raises the suppression flag of the current thread until dropped.
///
/// The prior value is restored on drop, including when the delegation
/// fails or unwinds, so nested guards compose.
pub(crate) struct SuppressGuard {
    prior: bool,
    // The flag is thread local, the guard must be released on the same thread.
    _marker: PhantomData<*const ()>,
}

impl SuppressGuard {
    #[inline]
    pub(crate) fn raise() -> Self {
        Self {
            prior: NO_MIDDLEWARE.with(|flag| flag.replace(true)),
            _marker: PhantomData,
        }
    }
}

impl Drop for SuppressGuard {
    #[inline]
    fn drop(&mut self) {
        NO_MIDDLEWARE.with(|flag| flag.set(self.prior));
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::thread;

    use super::{SuppressGuard, middleware_suppressed};

    #[test]
    fn nested_guards_restore_prior_value() {
        assert!(!middleware_suppressed());
        {
            let _outer = SuppressGuard::raise();
            assert!(middleware_suppressed());
            {
                let _inner = SuppressGuard::raise();
                assert!(middleware_suppressed());
            }
            assert!(middleware_suppressed());
        }
        assert!(!middleware_suppressed());
    }

    #[test]
    fn flag_does_not_leak_across_threads() {
        let _guard = SuppressGuard::raise();
        assert!(middleware_suppressed());
        let other = thread::spawn(middleware_suppressed).join().unwrap();
        assert!(!other);
    }

    #[test]
    fn flag_is_lowered_on_unwind() {
        let unwound = std::panic::catch_unwind(|| {
            let _guard = SuppressGuard::raise();
            panic!("delegation failed");
        });
        assert!(unwound.is_err());
        assert!(!middleware_suppressed());
    }
}
