//! Cancellation handles.
//!
//! Every timer, frame request, listener, and mounted DOM node in this crate is
//! released through a [`Disposer`] handed out at registration time. Dropping
//! the disposer releases the resource; there is no separate "unsubscribe"
//! call to forget.

#[cfg(test)]
#[path = "dispose_test.rs"]
mod dispose_test;

/// Runs its teardown exactly once, on [`Disposer::dispose`] or on drop.
#[must_use = "dropping a Disposer immediately releases what it guards"]
pub struct Disposer {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Disposer {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self { teardown: Some(Box::new(teardown)) }
    }

    /// A disposer that releases nothing.
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Release now. Equivalent to dropping, but reads better at call sites.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("armed", &self.teardown.is_some())
            .finish()
    }
}

/// An ordered group of disposers released last-in, first-out.
#[derive(Debug, Default)]
pub struct DisposeBag {
    items: Vec<Disposer>,
}

impl DisposeBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposer: Disposer) {
        self.items.push(disposer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Release everything, newest first.
    pub fn clear(&mut self) {
        while let Some(disposer) = self.items.pop() {
            disposer.dispose();
        }
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.clear();
    }
}
