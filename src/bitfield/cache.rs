use crate::bitfield::{Plan, Result, SchemaBuilder};
use core::any::{Any, TypeId};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

type Key = (TypeId, &'static str);

/// Compiled plans, keyed by record type and schema name.
///
/// Each plan is compiled at most once: concurrent first uses of the same key race for the write lock, and the loser
/// picks up the winner's plan.
#[derive(Default)]
pub struct PlanCache {
    plans: RwLock<HashMap<Key, Arc<dyn Any + Send + Sync>>>,
}

impl core::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlanCache")
            .field("len", &self.len())
            .finish()
    }
}

impl PlanCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the plan cached under `name` for `T`, compiling the schema produced by `build` if there is none yet.
    pub fn get_or_compile<T, F>(&self, name: &'static str, build: F) -> Result<Arc<Plan<T>>>
    where
        T: 'static,
        F: FnOnce(SchemaBuilder<T>) -> SchemaBuilder<T>,
    {
        let key = (TypeId::of::<T>(), name);
        if let Some(plan) = Self::lookup(&self.plans.read(), &key) {
            return Ok(plan);
        }

        let mut plans = self.plans.write();
        if let Some(plan) = Self::lookup(&plans, &key) {
            return Ok(plan);
        }

        let schema = build(SchemaBuilder::new()).build();
        let plan = Arc::new(Plan::compile(&schema)?);
        tracing::debug!(
            name,
            fields = plan.len(),
            bits = plan.container().bits(),
            "compiled bitfield plan"
        );
        let erased: Arc<dyn Any + Send + Sync> = plan.clone();
        plans.insert(key, erased);
        Ok(plan)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    fn lookup<T>(plans: &HashMap<Key, Arc<dyn Any + Send + Sync>>, key: &Key) -> Option<Arc<Plan<T>>>
    where
        T: 'static,
    {
        plans
            .get(key)
            .and_then(|x| Arc::clone(x).downcast::<Plan<T>>().ok())
    }
}

#[cfg(test)]
mod tests {
    use crate::{bitfield::PlanCache, io::Endian};
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    #[derive(Default)]
    struct Record {
        low: u8,
        high: u8,
    }

    #[test]
    fn plans_are_compiled_once() -> anyhow::Result<()> {
        let cache = PlanCache::new();
        let mut builds = 0;

        let first = cache.get_or_compile::<Record, _>("nibbles", |x| {
            builds += 1;
            x.u8(4, |r, v| r.low = v).u8(4, |r, v| r.high = v)
        })?;
        let second = cache.get_or_compile::<Record, _>("nibbles", |x| {
            builds += 1;
            x
        })?;

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn keys_include_the_record_type() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Other {
            value: u16,
        }

        let cache = PlanCache::new();
        cache.get_or_compile::<Record, _>("word", |x| {
            x.u8(4, |r, v| r.low = v).u8(4, |r, v| r.high = v)
        })?;
        let other = cache.get_or_compile::<Other, _>("word", |x| x.u16(16, |r, v| r.value = v))?;

        let mut record = Other::default();
        other.apply(0xBEEF, Endian::Little, &mut record);
        assert_eq!(record.value, 0xBEEF);
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn failed_compiles_are_not_cached() {
        let cache = PlanCache::new();
        let result = cache.get_or_compile::<Record, _>("short", |x| x.u8(4, |r, v| r.low = v));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_first_use() -> anyhow::Result<()> {
        let cache = Arc::new(PlanCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0u8..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || -> anyhow::Result<(u8, u8)> {
                    let plan = cache.get_or_compile::<Record, _>("nibbles", |x| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        x.u8(4, |r, v| r.low = v).u8(4, |r, v| r.high = v)
                    })?;
                    let mut record = Record::default();
                    plan.apply(u64::from(i * 0x11), Endian::Little, &mut record);
                    Ok((record.low, record.high))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let (low, high) = handle
                .join()
                .map_err(|_| anyhow::anyhow!("decoding thread panicked"))??;
            assert_eq!((usize::from(low), usize::from(high)), (i, i));
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
