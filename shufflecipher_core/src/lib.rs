//! Core engine for ShuffleCipher, a symmetric substitution cipher whose
//! substitution table mutates itself after every symbol.
//!
//! The cipher state is a permutation of the alphabet's lexical values,
//! seeded from a key. Each processed symbol emits its neighbor in the
//! permutation and then perturbs the permutation through one metacipher
//! round, so identical configurations on both ends stay synchronized
//! without ever transmitting state.
//!
//! This is an oddball experimental construction with no cryptanalysis
//! behind it. The implementation favors clarity over performance and
//! should **not** be used for production security.
//!
//! # Examples
//!
//! ```
//! use shufflecipher_core::{OutputFormat, ShuffleCipher};
//!
//! let mut encoder = ShuffleCipher::new();
//! encoder.set_output_format(OutputFormat::Text);
//! encoder.set_key("secret");
//!
//! let mut decoder = encoder.clone();
//!
//! let ciphertext = encoder
//!     .encrypt_text("the quick brown fox")
//!     .into_text()
//!     .unwrap();
//! let recovered = decoder.decrypt_text(&ciphertext).into_text().unwrap();
//! assert_eq!(recovered, "the quick brown fox");
//! ```

pub mod alphabet;
pub mod cipher;
pub mod config;
pub mod error;
pub mod metacipher;
pub mod output;
pub mod rng;
pub mod round;
pub mod state;

pub use crate::alphabet::{Alphabet, DEFAULT_ALPHABET};
pub use crate::cipher::{FeedbackSettings, OperationMode, ShuffleCipher, DEFAULT_IV_LEN};
pub use crate::config::{CipherConfig, CIPHER_CONFIG_VERSION};
pub use crate::error::ShuffleError;
pub use crate::metacipher::{
    random_modest_config, random_wide_config, DisplacementMode, DisplacementParams,
    MetaCipherConfig, MetaCipherEntry, ModestRandomParams, WideRandomParams,
};
pub use crate::output::{OutputFormat, StreamItem, TransformOutput};
pub use crate::rng::{derive_rng, random_iv, secure_rng, SecureRng};
pub use crate::state::PermutationState;
