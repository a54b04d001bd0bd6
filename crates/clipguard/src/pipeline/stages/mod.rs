pub mod anonymizer;
pub mod decryptor;
pub mod passthrough;
pub mod persistor;

pub use anonymizer::AnonymizerStage;
pub use decryptor::Decryptor;
pub use passthrough::Passthrough;
pub use persistor::Persistor;
