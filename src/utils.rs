//! Small ambient utilities: the injected parallel-for abstraction (spec §5) and a
//! trivial bounded free-list (spec §9, "Resource pool").

/// Abstract `forLoop(0, n, body)` the spec asks the engine to consume rather than own
/// a thread pool itself. The sequential `()` impl is always available; the `parallel`
/// feature adds a `rayon`-backed one with the identical interface.
pub trait ParallelFor {
    fn for_each(&self, len: usize, body: impl Fn(usize) + Sync + Send);
}

/// Default: runs the body in order on the calling thread.
pub struct Sequential;

impl ParallelFor for Sequential {
    fn for_each(&self, len: usize, body: impl Fn(usize) + Sync + Send) {
        for i in 0..len {
            body(i);
        }
    }
}

#[cfg(feature = "parallel")]
pub struct Rayon;

#[cfg(feature = "parallel")]
impl ParallelFor for Rayon {
    fn for_each(&self, len: usize, body: impl Fn(usize) + Sync + Send) {
        use rayon::prelude::*;
        (0..len).into_par_iter().for_each(|i| body(i));
    }
}

/// A growable free-list. Single-threaded by contract (spec §9: "callers ensure thread
/// affinity or wrap with their own lock").
pub struct ResourcePool<T> {
    free: Vec<T>,
    factory: Box<dyn Fn() -> T>,
}

impl<T> ResourcePool<T> {
    pub fn new(factory: impl Fn() -> T + 'static) -> Self {
        Self {
            free: Vec::new(),
            factory: Box::new(factory),
        }
    }

    pub fn take(&mut self) -> T {
        self.free.pop().unwrap_or_else(|| (self.factory)())
    }

    pub fn give_back(&mut self, item: T) {
        self.free.push(item);
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_visits_every_index_in_order() {
        let seen = std::sync::Mutex::new(Vec::new());
        Sequential.for_each(5, |i| seen.lock().unwrap().push(i));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pool_reuses_given_back_items() {
        let mut pool = ResourcePool::new(|| Vec::<u8>::with_capacity(16));
        let item = pool.take();
        pool.give_back(item);
        assert_eq!(pool.len(), 1);
        let _ = pool.take();
        assert!(pool.is_empty());
    }
}
