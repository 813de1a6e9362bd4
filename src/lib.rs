pub mod alphabet;
pub mod art;
pub mod config;
pub mod error;
pub mod io_utils;
pub mod primality;
pub mod report;
pub mod search;
pub mod verdict_cache;

pub use alphabet::Alphabet;
pub use art::DigitArt;
pub use config::SearchSettings;
pub use error::{Result, SearchError};
pub use primality::{classify_many, is_probable_prime, parse_digits, power_mod, PrimalityOracle};
pub use report::SearchReport;
pub use search::{
    estimated_attempts, perturb, ChannelSink, NoProgress, PerturbationSearch, ProgressSink,
    SearchConfig, SearchHandle, SearchProgress, SearchState,
};
pub use verdict_cache::{CacheStats, VerdictCache};
