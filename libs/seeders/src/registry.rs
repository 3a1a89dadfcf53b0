use std::{
    any::type_name,
    panic::{AssertUnwindSafe, catch_unwind},
};

use anyhow::Result;

use crate::{Seed, errors::panic_message};

type SeedFactory<C> =
    Box<dyn Fn() -> Result<Box<dyn Seed<C>>> + Send + Sync + 'static>;

struct SeedEntry<C> {
    name: String,
    factory: SeedFactory<C>,
}

/// Explicit list of the seed units an application provides.
///
/// Registration order is the discovery order, which decides execution
/// order among units that share an `order` value.
pub struct SeedRegistry<C> {
    entries: Vec<SeedEntry<C>>,
}

/// A registry entry after its factory ran. `unit` holds the instance and
/// its order, or the message explaining why neither could be obtained.
pub(crate) struct DiscoveredSeed<C> {
    pub name: String,
    pub unit: Result<(i32, Box<dyn Seed<C>>), String>,
}

impl<C: Send + 'static> SeedRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `S` under its fully qualified type name, instantiated
    /// with `S::default()` at the start of every run.
    pub fn register<S>(self) -> Self
    where
        S: Seed<C> + Default + 'static,
    {
        self.register_with(type_name::<S>(), || Ok(S::default()))
    }

    /// Registers a fallible factory under `name`. A factory error fails
    /// only this unit.
    pub fn register_with<S, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        S: Seed<C> + 'static,
        F: Fn() -> Result<S> + Send + Sync + 'static,
    {
        self.entries.push(SeedEntry {
            name: name.into(),
            factory: Box::new(move || {
                factory().map(|seed| Box::new(seed) as Box<dyn Seed<C>>)
            }),
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Instantiates every registered unit once and reads its order.
    /// Factory errors and panics are captured per unit.
    pub(crate) fn discover(&self) -> Vec<DiscoveredSeed<C>> {
        self.entries
            .iter()
            .map(|entry| DiscoveredSeed {
                name: entry.name.clone(),
                unit: instantiate(entry),
            })
            .collect()
    }
}

fn instantiate<C: Send>(
    entry: &SeedEntry<C>,
) -> Result<(i32, Box<dyn Seed<C>>), String> {
    let seed = match catch_unwind(AssertUnwindSafe(|| (entry.factory)())) {
        Ok(Ok(seed)) => seed,
        Ok(Err(e)) => return Err(format!("{e:#}")),
        Err(payload) => return Err(panic_message(payload.as_ref())),
    };

    match catch_unwind(AssertUnwindSafe(|| seed.order())) {
        Ok(order) => Ok((order, seed)),
        Err(payload) => Err(format!(
            "reading order {}",
            panic_message(payload.as_ref())
        )),
    }
}

impl<C: Send + 'static> Default for SeedRegistry<C> {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RolesSeed;

    #[async_trait]
    impl Seed<Vec<String>> for RolesSeed {
        fn order(&self) -> i32 { 1 }

        async fn apply(
            &self, context: &mut Vec<String>, _amount_of_objects: usize,
        ) -> Result<()> {
            context.push("roles".to_string());
            Ok(())
        }
    }

    struct BrokenOrderSeed;

    #[async_trait]
    impl Seed<Vec<String>> for BrokenOrderSeed {
        fn order(&self) -> i32 { panic!("order not configured") }

        async fn apply(
            &self, _context: &mut Vec<String>, _amount_of_objects: usize,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_uses_type_name() {
        let registry = SeedRegistry::<Vec<String>>::new().register::<RolesSeed>();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("registry::tests::RolesSeed"));
    }

    #[test]
    fn test_discover_keeps_registration_order() {
        let registry = SeedRegistry::<Vec<String>>::new()
            .register_with("b", || Ok(RolesSeed))
            .register_with("a", || Ok(RolesSeed));

        let names: Vec<String> =
            registry.discover().into_iter().map(|d| d.name).collect();

        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_factory_error_is_captured() {
        let registry = SeedRegistry::<Vec<String>>::new().register_with(
            "missing",
            || -> Result<RolesSeed> { Err(anyhow::anyhow!("no such seed")) },
        );

        let discovered = registry.discover();

        assert_eq!(discovered[0].unit.as_ref().err().unwrap(), "no such seed");
    }

    #[test]
    fn test_order_panic_is_captured() {
        let registry = SeedRegistry::<Vec<String>>::new()
            .register_with("broken", || Ok(BrokenOrderSeed))
            .register::<RolesSeed>();

        let discovered = registry.discover();

        assert_eq!(
            discovered[0].unit.as_ref().err().unwrap(),
            "reading order panicked: order not configured"
        );
        assert_eq!(discovered[1].unit.as_ref().ok().unwrap().0, 1);
    }

    #[test]
    fn test_every_discovery_instantiates_again() {
        let registry = SeedRegistry::<Vec<String>>::new().register::<RolesSeed>();

        assert_eq!(registry.discover().len(), 1);
        assert_eq!(registry.discover().len(), 1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
