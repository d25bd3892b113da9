use crate::domain::ports::SubjectRegistry;
use crate::domain::subject::{Pet, Shelter};
use crate::error::Result;
use serde::Deserialize;
use std::io::Read;

/// The pets and shelters a fresh registry starts with.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Seed {
    #[serde(default)]
    pub pets: Vec<Pet>,
    #[serde(default)]
    pub shelters: Vec<Shelter>,
}

/// Reads a registry seed from a JSON document such as
/// `{"pets": [{"id": 7, "name": "Biscuit"}], "shelters": [{"id": 3, "name": "Paws"}]}`.
pub struct SeedReader<R: Read> {
    source: R,
}

impl<R: Read> SeedReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn read(self) -> Result<Seed> {
        Ok(serde_json::from_reader(self.source)?)
    }
}

impl Seed {
    /// Adds every entry to the registry. Existing ids are overwritten.
    pub async fn load_into(self, registry: &dyn SubjectRegistry) -> Result<(usize, usize)> {
        let counts = (self.pets.len(), self.shelters.len());
        for pet in self.pets {
            registry.add_pet(pet).await?;
        }
        for shelter in self.shelters {
            registry.add_shelter(shelter).await?;
        }
        tracing::info!(pets = counts.0, shelters = counts.1, "Registry seeded");
        Ok(counts)
    }
}
