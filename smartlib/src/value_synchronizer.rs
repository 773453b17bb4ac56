use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use embassy_sync::blocking_mutex::Mutex;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

/// A value shared between tasks, where any number of watchers (up to `WATCHER_COUNT`
/// concurrently waiting) get notified whenever it changes.
pub struct ValueSynchronizer<const WATCHER_COUNT: usize, M: RawMutex, T>(
    Mutex<M, RefCell<ValueSynchronizerData<WATCHER_COUNT, T>>>,
);

struct ValueSynchronizerData<const WATCHER_COUNT: usize, T> {
    value: T,
    wakers: MultiWakerRegistration<WATCHER_COUNT>,
    counter: usize,
}

impl<const WATCHER_COUNT: usize, M: RawMutex, T> ValueSynchronizer<WATCHER_COUNT, M, T> {
    pub const fn new(value: T) -> Self {
        Self(Mutex::new(RefCell::new(ValueSynchronizerData {
            value,
            wakers: MultiWakerRegistration::new(),
            counter: 0,
        })))
    }

    /// f should not block
    pub fn read<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.0.lock(|v| f(&v.borrow().value))
    }

    pub fn read_clone(&self) -> T
    where
        T: Clone,
    {
        self.read(|v| v.clone())
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.update_if(|v| {
            f(v);
            true
        });
    }

    /// Like `update`, but watchers are only notified if `f` reports a change.
    /// Returns what `f` returned.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.0.lock(|inner| {
            let mut s = inner.borrow_mut();
            let changed = f(&mut s.value);
            if changed {
                s.counter = s.counter.wrapping_add(1);
                s.wakers.wake();
            }
            changed
        })
    }

    pub fn watch(&self) -> Watcher<'_, WATCHER_COUNT, M, T> {
        Watcher {
            last_counter: self.0.lock(|v| v.borrow().counter),
            synchronizer: self,
        }
    }
}

pub struct Watcher<'a, const WATCHER_COUNT: usize, M: RawMutex, T> {
    synchronizer: &'a ValueSynchronizer<WATCHER_COUNT, M, T>,
    last_counter: usize,
}

impl<'a, const WATCHER_COUNT: usize, M: RawMutex, T> Watcher<'a, WATCHER_COUNT, M, T> {
    /// Resolves with the current value as soon as it changed since the last read.
    pub fn read<'s>(&'s mut self) -> ReaderFuture<'s, 'a, WATCHER_COUNT, M, T>
    where
        T: Clone,
    {
        ReaderFuture(self)
    }

    /// Marks every change made so far as seen.
    pub fn skip(&mut self) {
        self.last_counter = self.synchronizer.0.lock(|v| v.borrow().counter);
    }
}

pub struct ReaderFuture<'s, 'a, const WATCHER_COUNT: usize, M: RawMutex, T: Clone>(
    &'s mut Watcher<'a, WATCHER_COUNT, M, T>,
);

impl<'s, 'a, const WATCHER_COUNT: usize, M: RawMutex, T: Clone> Future
    for ReaderFuture<'s, 'a, WATCHER_COUNT, M, T>
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.synchronizer.0.lock(|inner| {
            let mut s = inner.borrow_mut();
            if s.counter != self.0.last_counter {
                self.0.last_counter = s.counter;
                Poll::Ready(s.value.clone())
            } else {
                s.wakers.register(cx.waker());
                Poll::Pending
            }
        })
    }
}
