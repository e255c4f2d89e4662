//! Core object pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{BoxError, HookStage, PoolError, PoolResult};
use crate::handle::{next_pool_id, PoolHandle};
use crate::metrics::{MetricsTracker, PoolMetrics};

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{debug, error, trace, warn};

#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;
#[cfg(feature = "metrics")]
use std::collections::HashMap;

type Factory<T> = Box<dyn FnMut() -> Result<T, BoxError>>;
type Hook<T> = Box<dyn FnMut(&mut T) -> Result<(), BoxError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Active,
}

struct Slot<T> {
    value: T,
    state: SlotState,
    generation: u64,
    checkout_seq: u64,
}

/// A checked-out instance that is released back to the pool when dropped
///
/// Holds the pool mutably for as long as it lives.
pub struct PooledObject<'a, T: 'static> {
    pool: &'a mut ObjectPool<T>,
    handle: PoolHandle,
    armed: bool,
}

impl<'a, T: 'static> PooledObject<'a, T> {
    /// Handle of this checkout
    pub fn handle(&self) -> PoolHandle {
        self.handle
    }

    /// Release now and report any hook failure instead of logging it
    pub fn release(mut self) -> PoolResult<()> {
        self.armed = false;
        self.pool.release(self.handle)
    }
}

impl<T: 'static> Deref for PooledObject<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.pool.slots[self.handle.index].value
    }
}

impl<T: 'static> DerefMut for PooledObject<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool.slots[self.handle.index].value
    }
}

impl<T: 'static> Drop for PooledObject<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = self.pool.release(self.handle) {
                error!(
                    pool = %self.pool.config.name,
                    handle = %self.handle,
                    error = %err,
                    "Failed to release pooled object on drop"
                );
            }
        }
    }
}

/// Builder for [`ObjectPool`]
///
/// # Examples
///
/// ```
/// use recycle_pool::ObjectPool;
///
/// let mut pool = ObjectPool::builder()
///     .factory(|| String::with_capacity(64))
///     .on_release(|s: &mut String| s.clear())
///     .preload(4)
///     .build()
///     .unwrap();
///
/// assert_eq!(pool.pool_size(), 4);
/// assert_eq!(pool.active_count(), 0);
/// ```
pub struct PoolBuilder<T: 'static> {
    factory: Option<Factory<T>>,
    on_acquire: Option<Hook<T>>,
    on_release: Option<Hook<T>>,
    config: PoolConfiguration,
}

impl<T: 'static> PoolBuilder<T> {
    pub fn new() -> Self {
        Self {
            factory: None,
            on_acquire: None,
            on_release: None,
            config: PoolConfiguration::default(),
        }
    }

    /// Set an infallible factory
    pub fn factory<F>(mut self, mut factory: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        self.factory = Some(Box::new(move || Ok(factory())));
        self
    }

    /// Set a factory that may fail
    pub fn try_factory<F, E>(mut self, mut factory: F) -> Self
    where
        F: FnMut() -> Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        self.factory = Some(Box::new(move || factory().map_err(Into::into)));
        self
    }

    /// Run `hook` on every instance right before it is handed out
    pub fn on_acquire<F>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_acquire = Some(Box::new(move |value| {
            hook(value);
            Ok(())
        }));
        self
    }

    /// Fallible variant of [`on_acquire`](Self::on_acquire)
    pub fn try_on_acquire<F, E>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&mut T) -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        self.on_acquire = Some(Box::new(move |value| hook(value).map_err(Into::into)));
        self
    }

    /// Run `hook` on every instance right before it becomes idle
    pub fn on_release<F>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_release = Some(Box::new(move |value| {
            hook(value);
            Ok(())
        }));
        self
    }

    /// Fallible variant of [`on_release`](Self::on_release)
    pub fn try_on_release<F, E>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&mut T) -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        self.on_release = Some(Box::new(move |value| hook(value).map_err(Into::into)));
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: PoolConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn preload(mut self, count: usize) -> Self {
        self.config.preload_count = count;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Build the pool, creating the preload population
    ///
    /// Fails with [`PoolError::MissingFactory`] when no factory was set, or
    /// with the first factory or release hook error hit while preloading.
    pub fn build(self) -> PoolResult<ObjectPool<T>> {
        let factory = self.factory.ok_or(PoolError::MissingFactory)?;
        let reserve = self.config.reserve_hint();

        let mut pool = ObjectPool {
            id: next_pool_id(),
            slots: Vec::with_capacity(reserve),
            idle: VecDeque::with_capacity(reserve),
            active_count: 0,
            next_checkout: 0,
            factory,
            on_acquire: self.on_acquire,
            on_release: self.on_release,
            config: self.config,
            metrics: MetricsTracker::default(),
        };

        for _ in 0..pool.config.preload_count {
            let index = pool.create_slot()?;
            pool.run_hook(HookStage::Release, index)?;
            pool.idle.push_back(index);
        }

        debug!(
            pool = %pool.config.name,
            preload = pool.config.preload_count,
            "Created object pool"
        );

        Ok(pool)
    }
}

impl<T: 'static> Default for PoolBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-threaded pool recycling instances of `T`
///
/// Every instance the factory produces is owned by the pool for the pool's
/// whole lifetime and is always either idle or active. Idle instances are
/// handed out oldest-released first.
///
/// # Examples
///
/// ```
/// use recycle_pool::ObjectPool;
///
/// let mut next = 0;
/// let mut pool = ObjectPool::new(move || { next += 1; next }, 2).unwrap();
///
/// let a = pool.acquire().unwrap();
/// let b = pool.acquire().unwrap();
/// let c = pool.acquire().unwrap();
/// assert_eq!(pool.get(a), Some(&1));
/// assert_eq!(pool.get(b), Some(&2));
/// assert_eq!(pool.get(c), Some(&3));
///
/// pool.release(a).unwrap();
/// assert!(pool.release(a).is_err());
/// ```
pub struct ObjectPool<T: 'static> {
    id: u64,
    slots: Vec<Slot<T>>,
    idle: VecDeque<usize>,
    active_count: usize,
    next_checkout: u64,
    factory: Factory<T>,
    on_acquire: Option<Hook<T>>,
    on_release: Option<Hook<T>>,
    config: PoolConfiguration,
    metrics: MetricsTracker,
}

impl<T: 'static> ObjectPool<T> {
    /// Start building a pool
    pub fn builder() -> PoolBuilder<T> {
        PoolBuilder::new()
    }

    /// Create a pool without hooks, preloading `preload_count` instances
    pub fn new<F>(factory: F, preload_count: usize) -> PoolResult<Self>
    where
        F: FnMut() -> T + 'static,
    {
        PoolBuilder::new().factory(factory).preload(preload_count).build()
    }

    /// Check out an instance
    ///
    /// Takes the front of the idle queue, or asks the factory for a new
    /// instance when nothing is idle. The acquire hook has run on the
    /// instance by the time the handle is returned.
    ///
    /// If the acquire hook fails on a freshly created instance, the release
    /// hook resets it and it joins the idle tail. Should that reset fail
    /// too, the fresh instance is dropped and the pool is left as before
    /// the call.
    pub fn acquire(&mut self) -> PoolResult<PoolHandle> {
        let index = match self.idle.front().copied() {
            Some(index) => {
                self.run_hook(HookStage::Acquire, index)?;
                self.idle.pop_front();
                index
            }
            None => {
                let index = self.create_slot()?;
                if let Err(err) = self.run_hook(HookStage::Acquire, index) {
                    self.park_fresh(index);
                    return Err(err);
                }
                index
            }
        };

        Ok(self.activate(index))
    }

    /// Check out an instance behind a guard that releases it on drop
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::ObjectPool;
    ///
    /// let mut pool = ObjectPool::new(Vec::<u32>::new, 1).unwrap();
    /// {
    ///     let mut buffer = pool.checkout().unwrap();
    ///     buffer.push(7);
    /// }
    /// assert_eq!(pool.active_count(), 0);
    /// assert_eq!(pool.idle_count(), 1);
    /// ```
    pub fn checkout(&mut self) -> PoolResult<PooledObject<'_, T>> {
        let handle = self.acquire()?;
        Ok(PooledObject {
            pool: self,
            handle,
            armed: true,
        })
    }

    /// Return a checked-out instance to the tail of the idle queue
    ///
    /// Rejects handles that are not currently active: a second release of
    /// the same handle, a handle whose instance has been checked out again
    /// since, or a handle from another pool. Pool state is untouched when a
    /// release is rejected or the release hook fails.
    pub fn release(&mut self, handle: PoolHandle) -> PoolResult<()> {
        let index = match self.check_active(handle) {
            Ok(index) => index,
            Err(err) => {
                self.metrics.protocol_violations += 1;
                warn!(pool = %self.config.name, %handle, error = %err, "Rejected release");
                return Err(err);
            }
        };

        self.run_hook(HookStage::Release, index)?;

        self.slots[index].state = SlotState::Idle;
        self.active_count -= 1;
        self.idle.push_back(index);
        self.metrics.total_released += 1;
        trace!(pool = %self.config.name, %handle, "Released instance");
        Ok(())
    }

    /// Release every active instance, oldest checkout first
    ///
    /// Returns how many were released. Stops at the first release hook
    /// failure, leaving the rest active.
    pub fn release_all_active(&mut self) -> PoolResult<usize> {
        let mut checked_out: Vec<(u64, PoolHandle)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state == SlotState::Active)
            .map(|(index, slot)| (slot.checkout_seq, self.handle_for(index)))
            .collect();
        checked_out.sort_unstable_by_key(|(seq, _)| *seq);

        let mut released = 0;
        for (_, handle) in checked_out {
            self.release(handle)?;
            released += 1;
        }
        Ok(released)
    }

    /// Borrow a checked-out instance
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let index = self.check_active(handle).ok()?;
        Some(&self.slots[index].value)
    }

    /// Mutably borrow a checked-out instance
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let index = self.check_active(handle).ok()?;
        Some(&mut self.slots[index].value)
    }

    /// Whether `handle` refers to a live checkout of this pool
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.check_active(handle).is_ok()
    }

    /// Get active count
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Idle plus active instances. Never decreases.
    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        self.metrics.get_metrics(self.active_count, self.idle.len())
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        Ok(MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)?)
    }

    fn create_slot(&mut self) -> PoolResult<usize> {
        let value = (self.factory)().map_err(|err| {
            self.metrics.hook_failures += 1;
            warn!(pool = %self.config.name, error = %err, "Factory failed");
            PoolError::Factory(err)
        })?;

        let index = self.slots.len();
        self.slots.push(Slot {
            value,
            state: SlotState::Idle,
            generation: 0,
            checkout_seq: 0,
        });
        self.metrics.total_created += 1;
        trace!(pool = %self.config.name, index, "Created instance");
        Ok(index)
    }

    fn run_hook(&mut self, stage: HookStage, index: usize) -> PoolResult<()> {
        let hook = match stage {
            HookStage::Acquire => self.on_acquire.as_mut(),
            HookStage::Release => self.on_release.as_mut(),
        };
        let Some(hook) = hook else {
            return Ok(());
        };

        hook(&mut self.slots[index].value).map_err(|err| {
            self.metrics.hook_failures += 1;
            warn!(pool = %self.config.name, %stage, index, error = %err, "Hook failed");
            PoolError::hook(stage, err)
        })
    }

    // `index` must be the last slot, created by the current call.
    fn park_fresh(&mut self, index: usize) {
        if self.run_hook(HookStage::Release, index).is_ok() {
            self.idle.push_back(index);
        } else {
            self.slots.truncate(index);
            debug!(pool = %self.config.name, index, "Dropped unprepared instance");
        }
    }

    fn activate(&mut self, index: usize) -> PoolHandle {
        let slot = &mut self.slots[index];
        slot.state = SlotState::Active;
        slot.generation += 1;
        slot.checkout_seq = self.next_checkout;
        self.next_checkout += 1;
        self.active_count += 1;
        self.metrics.total_acquired += 1;

        let handle = self.handle_for(index);
        trace!(pool = %self.config.name, %handle, "Acquired instance");
        handle
    }

    fn handle_for(&self, index: usize) -> PoolHandle {
        PoolHandle {
            pool_id: self.id,
            index,
            generation: self.slots[index].generation,
        }
    }

    fn check_active(&self, handle: PoolHandle) -> PoolResult<usize> {
        if handle.pool_id != self.id {
            return Err(PoolError::UnknownHandle(handle));
        }
        let Some(slot) = self.slots.get(handle.index) else {
            return Err(PoolError::UnknownHandle(handle));
        };
        if slot.generation != handle.generation {
            return Err(PoolError::StaleHandle(handle));
        }
        if slot.state == SlotState::Idle {
            return Err(PoolError::AlreadyReleased(handle));
        }
        Ok(handle.index)
    }
}

impl<T: 'static> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.config.name)
            .field("idle", &self.idle.len())
            .field("active", &self.active_count)
            .finish()
    }
}
