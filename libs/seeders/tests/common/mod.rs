#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use seeders::{Seed, SeedRegistry};
use test_utils::MemoryScope;

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Writes `seed:<name>` to the scope journal, then behaves as told.
pub struct ScriptedSeed {
    pub name: &'static str,
    pub order: i32,
    pub behavior: Behavior,
}

#[async_trait]
impl Seed<MemoryScope> for ScriptedSeed {
    fn order(&self) -> i32 { self.order }

    async fn apply(
        &self, context: &mut MemoryScope, amount_of_objects: usize,
    ) -> Result<()> {
        context.record(format!("seed:{}", self.name));
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => {
                bail!("{} could not insert {amount_of_objects} rows", self.name)
            }
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }
}

/// Cannot say when it should run.
pub struct UnorderedSeed;

#[async_trait]
impl Seed<MemoryScope> for UnorderedSeed {
    fn order(&self) -> i32 { panic!("order not configured") }

    async fn apply(
        &self, context: &mut MemoryScope, _amount_of_objects: usize,
    ) -> Result<()> {
        context.record("seed:Unordered");
        Ok(())
    }
}

/// Records the batch size it was given.
#[derive(Default)]
pub struct AmountSeed;

#[async_trait]
impl Seed<MemoryScope> for AmountSeed {
    fn order(&self) -> i32 { 0 }

    async fn apply(
        &self, context: &mut MemoryScope, amount_of_objects: usize,
    ) -> Result<()> {
        context.record(format!("amount:{amount_of_objects}"));
        Ok(())
    }
}

pub fn scripted(
    registry: SeedRegistry<MemoryScope>, name: &'static str, order: i32,
    behavior: Behavior,
) -> SeedRegistry<MemoryScope> {
    registry.register_with(name, move || {
        Ok(ScriptedSeed {
            name,
            order,
            behavior,
        })
    })
}

pub fn registry_of(units: &[(&'static str, i32)]) -> SeedRegistry<MemoryScope> {
    units.iter().fold(SeedRegistry::new(), |registry, (name, order)| {
        scripted(registry, name, *order, Behavior::Succeed)
    })
}

pub fn seeds_in(journal: &[String]) -> Vec<String> {
    journal
        .iter()
        .filter_map(|entry| entry.strip_prefix("seed:"))
        .map(str::to_string)
        .collect()
}
