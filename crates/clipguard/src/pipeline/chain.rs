//! Chain assembly: which stages run, in which order, for each job class.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::anonymize::{Anonymizer, CommandAnonymizer};
use crate::catalog::Catalog;
use crate::config::schema::AnonymizersConfig;
use crate::error::WorkerError;
use crate::storage::ArtifactStore;

use super::stage::{AnonymizerKind, Stage, StageKind};
use super::stages::{AnonymizerStage, Decryptor, Passthrough, Persistor};

const EMPTY: &[StageKind] = &[StageKind::Passthrough];
const SIMPLE: &[StageKind] = &[
    StageKind::Decryptor,
    StageKind::Anonymizer(AnonymizerKind::Lightweight),
    StageKind::Persistor,
];
const NORMAL: &[StageKind] = &[
    StageKind::Decryptor,
    StageKind::Anonymizer(AnonymizerKind::Full),
    StageKind::Persistor,
];
const EXTENDED: &[StageKind] = &[
    StageKind::Decryptor,
    StageKind::Anonymizer(AnonymizerKind::Full),
    StageKind::Anonymizer(AnonymizerKind::Extended),
    StageKind::Persistor,
];

/// Job classification chosen by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    /// No processing; uploads are forwarded as-is.
    Empty,
    Simple,
    Normal,
    /// Full anonymization followed by the slower extended tool.
    #[serde(alias = "python")]
    Extended,
}

impl ChainType {
    pub const ALL: [ChainType; 4] = [
        ChainType::Empty,
        ChainType::Simple,
        ChainType::Normal,
        ChainType::Extended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChainType::Empty => "empty",
            ChainType::Simple => "simple",
            ChainType::Normal => "normal",
            ChainType::Extended => "extended",
        }
    }

    /// The ordered stage sequence for this class.
    pub fn stages(self) -> &'static [StageKind] {
        match self {
            ChainType::Empty => EMPTY,
            ChainType::Simple => SIMPLE,
            ChainType::Normal => NORMAL,
            ChainType::Extended => EXTENDED,
        }
    }
}

impl FromStr for ChainType {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(ChainType::Empty),
            "simple" => Ok(ChainType::Simple),
            "normal" => Ok(ChainType::Normal),
            "extended" | "python" => Ok(ChainType::Extended),
            _ => Err(WorkerError::UnknownChain(s.to_string())),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external tool per anonymization strength.
#[derive(Clone)]
pub struct AnonymizerSet {
    lightweight: Arc<dyn Anonymizer>,
    full: Arc<dyn Anonymizer>,
    extended: Arc<dyn Anonymizer>,
}

impl AnonymizerSet {
    pub fn new(
        lightweight: Arc<dyn Anonymizer>,
        full: Arc<dyn Anonymizer>,
        extended: Arc<dyn Anonymizer>,
    ) -> Self {
        Self {
            lightweight,
            full,
            extended,
        }
    }

    pub fn from_config(config: &AnonymizersConfig) -> Self {
        Self::new(
            Arc::new(CommandAnonymizer::new("lightweight", config.lightweight.clone())),
            Arc::new(CommandAnonymizer::new("full", config.full.clone())),
            Arc::new(CommandAnonymizer::new("extended", config.extended.clone())),
        )
    }

    pub fn get(&self, kind: AnonymizerKind) -> Arc<dyn Anonymizer> {
        match kind {
            AnonymizerKind::Lightweight => Arc::clone(&self.lightweight),
            AnonymizerKind::Full => Arc::clone(&self.full),
            AnonymizerKind::Extended => Arc::clone(&self.extended),
        }
    }
}

/// Builds stage instances from their kinds. Shared by all workers.
pub struct StageFactory {
    store: ArtifactStore,
    catalog: Arc<dyn Catalog>,
    anonymizers: AnonymizerSet,
}

impl StageFactory {
    pub fn new(store: ArtifactStore, catalog: Arc<dyn Catalog>, anonymizers: AnonymizerSet) -> Self {
        Self {
            store,
            catalog,
            anonymizers,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn create(&self, kind: StageKind) -> Box<dyn Stage> {
        match kind {
            StageKind::Passthrough => Box::new(Passthrough),
            StageKind::Decryptor => Box::new(Decryptor),
            StageKind::Anonymizer(strength) => {
                Box::new(AnonymizerStage::new(strength, self.anonymizers.get(strength)))
            }
            StageKind::Persistor => {
                Box::new(Persistor::new(self.store.clone(), Arc::clone(&self.catalog)))
            }
        }
    }

    /// Fresh stage instances for one run of `chain`.
    pub fn assemble(&self, chain: ChainType) -> Vec<Box<dyn Stage>> {
        chain.stages().iter().map(|kind| self.create(*kind)).collect()
    }
}

/// Resolves a classification name to its ordered stages. Unknown names are
/// rejected before anything is built.
pub fn build_chain(
    classification: &str,
    factory: &StageFactory,
) -> Result<Vec<Box<dyn Stage>>, WorkerError> {
    let chain: ChainType = classification.parse()?;
    Ok(factory.assemble(chain))
}
