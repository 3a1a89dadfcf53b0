use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

pub const DEFAULT_AMOUNT_OF_OBJECTS: usize = 20;

/// What a run does when the store is missing known migrations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPolicy {
    /// Fail the run before any seed executes.
    #[default]
    Strict,
    /// Apply the pending migrations, then seed.
    AutoMigrate,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder,
)]
pub struct SeedOptions {
    #[builder(default)]
    #[serde(default)]
    pub policy: MigrationPolicy,
    #[builder(default = DEFAULT_AMOUNT_OF_OBJECTS)]
    #[serde(default = "default_amount_of_objects")]
    pub amount_of_objects: usize,
}

impl Default for SeedOptions {
    fn default() -> Self { Self::builder().build() }
}

fn default_amount_of_objects() -> usize { DEFAULT_AMOUNT_OF_OBJECTS }
