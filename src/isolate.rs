//! Isolate lifecycle: one GraalVM isolate per session.

use crate::native::{IsolateThread, NativeApi};
use crate::otel::{native_span, NativeCall};
use crate::types::{H2gisError, Result};
use tracing::{debug, warn};

/// Owns the native library and the isolate created from it.
///
/// The isolate is torn down exactly once, by [`Isolate::tear_down`] or on
/// drop, whichever comes first.
pub struct Isolate<N: NativeApi> {
    native: N,
    thread: Option<IsolateThread>,
}

impl<N: NativeApi> Isolate<N> {
    /// Create the isolate.
    ///
    /// # Errors
    ///
    /// `IsolateCreation` with the native status when it is non-zero
    pub fn create(native: N) -> Result<Self> {
        let span = native_span(NativeCall::CreateIsolate, None);
        let _guard = span.enter();

        let thread = native
            .create_isolate()
            .map_err(|code| H2gisError::IsolateCreation { code })?;
        debug!("isolate created");

        Ok(Self {
            native,
            thread: Some(thread),
        })
    }

    /// Thread handle for native calls; `SessionClosed` once torn down.
    pub fn thread(&self) -> Result<&IsolateThread> {
        self.thread.as_ref().ok_or(H2gisError::SessionClosed)
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn is_live(&self) -> bool {
        self.thread.is_some()
    }

    /// Last error text from the native side, if the library reports one.
    pub fn last_error(&self) -> Option<String> {
        let thread = self.thread.as_ref()?;
        self.native.last_error(thread)
    }

    /// Tear the isolate down. Safe to call any number of times; failures
    /// are logged, never returned.
    pub fn tear_down(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        let span = native_span(NativeCall::TearDownIsolate, None);
        let _guard = span.enter();

        match self.native.tear_down_isolate(&thread) {
            0 => debug!("isolate torn down"),
            status => warn!(status, "isolate tear-down reported failure"),
        }
    }
}

impl<N: NativeApi> Drop for Isolate<N> {
    fn drop(&mut self) {
        self.tear_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::mock::{Call, MockNative};

    #[test]
    fn test_create_and_tear_down() {
        let native = MockNative::new();
        let mut isolate = Isolate::create(native.clone()).unwrap();
        assert!(isolate.is_live());
        assert!(isolate.thread().is_ok());

        isolate.tear_down();
        assert!(!isolate.is_live());
        assert!(matches!(isolate.thread(), Err(H2gisError::SessionClosed)));
        assert_eq!(native.calls(), vec![Call::CreateIsolate, Call::TearDownIsolate]);
    }

    #[test]
    fn test_creation_failure_carries_status() {
        let native = MockNative::new();
        native.set_create_status(7);

        let err = Isolate::create(native.clone()).err().unwrap();
        assert!(matches!(err, H2gisError::IsolateCreation { code: 7 }));
        // nothing to tear down
        assert_eq!(native.count(|c| *c == Call::TearDownIsolate), 0);
    }

    #[test]
    fn test_tear_down_is_idempotent() {
        let native = MockNative::new();
        let mut isolate = Isolate::create(native.clone()).unwrap();

        isolate.tear_down();
        isolate.tear_down();
        drop(isolate);

        assert_eq!(native.count(|c| *c == Call::TearDownIsolate), 1);
    }

    #[test]
    fn test_tear_down_failure_is_swallowed() {
        let native = MockNative::new();
        native.set_tear_down_status(-3);
        let mut isolate = Isolate::create(native.clone()).unwrap();

        isolate.tear_down();
        assert!(!isolate.is_live());
    }

    #[test]
    fn test_drop_tears_down() {
        let native = MockNative::new();
        drop(Isolate::create(native.clone()).unwrap());
        assert_eq!(native.count(|c| *c == Call::TearDownIsolate), 1);
    }
}
