//! Serializable cipher profiles.
//!
//! A [`CipherConfig`] captures everything two parties must agree on up
//! front: alphabet, key, operation mode, displacement parameters, both
//! metacipher configurations, and the IV generation length. Profiles are
//! versioned so stale files fail loudly instead of building a cipher
//! that silently disagrees with the other end. Live cipher *state* is
//! deliberately not serializable; a receiver reproduces it from the
//! profile plus the transmitted IV.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::alphabet::{Alphabet, DEFAULT_ALPHABET};
use crate::cipher::{OperationMode, ShuffleCipher, DEFAULT_IV_LEN};
use crate::error::ShuffleError;
use crate::metacipher::{DisplacementParams, MetaCipherConfig};
use crate::output::OutputFormat;

pub const CIPHER_CONFIG_VERSION: u16 = 1;

fn expect_version<E: DeError>(found: u16, expected: u16, label: &'static str) -> Result<(), E> {
    if found != expected {
        return Err(E::custom(format!(
            "{} version mismatch: expected {}, found {}",
            label, expected, found
        )));
    }
    Ok(())
}

/// Everything needed to reconstruct a cipher, minus its live state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CipherConfig {
    pub version: u16,
    pub alphabet: String,
    pub key: String,
    pub operation_mode: OperationMode,
    pub displacement: DisplacementParams,
    pub metacipher: MetaCipherConfig,
    pub offset_metacipher: MetaCipherConfig,
    pub iv_gen_len: usize,
    pub output_format: OutputFormat,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            version: CIPHER_CONFIG_VERSION,
            alphabet: DEFAULT_ALPHABET.to_string(),
            key: DEFAULT_ALPHABET.to_string(),
            operation_mode: OperationMode::Single,
            displacement: DisplacementParams::default(),
            metacipher: MetaCipherConfig::standard(),
            offset_metacipher: MetaCipherConfig::standard_offsets(),
            iv_gen_len: DEFAULT_IV_LEN,
            output_format: OutputFormat::Values,
        }
    }
}

impl<'de> Deserialize<'de> for CipherConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            alphabet: String,
            key: String,
            operation_mode: OperationMode,
            displacement: DisplacementParams,
            metacipher: MetaCipherConfig,
            offset_metacipher: MetaCipherConfig,
            iv_gen_len: usize,
            output_format: OutputFormat,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(helper.version, CIPHER_CONFIG_VERSION, "CipherConfig")?;
        Ok(Self {
            version: helper.version,
            alphabet: helper.alphabet,
            key: helper.key,
            operation_mode: helper.operation_mode,
            displacement: helper.displacement,
            metacipher: helper.metacipher,
            offset_metacipher: helper.offset_metacipher,
            iv_gen_len: helper.iv_gen_len,
            output_format: helper.output_format,
        })
    }
}

impl CipherConfig {
    /// Builds a cipher from this profile.
    ///
    /// # Errors
    /// Fails when the alphabet text is not a valid alphabet.
    pub fn build(&self) -> Result<ShuffleCipher, ShuffleError> {
        let alphabet = Alphabet::new(&self.alphabet)?;
        let mut cipher = ShuffleCipher::with_alphabet(alphabet);
        cipher.set_key(&self.key);
        cipher.set_operation_mode(self.operation_mode);
        cipher.set_displacement(self.displacement);
        cipher.set_metacipher(self.metacipher.clone());
        cipher.set_offset_metacipher(self.offset_metacipher.clone());
        cipher.set_iv_gen_len(self.iv_gen_len);
        cipher.set_output_format(self.output_format);
        Ok(cipher)
    }

    /// Extracts the profile of an existing cipher. The key field holds
    /// the normalized key rendered as symbol text.
    pub fn from_cipher(cipher: &ShuffleCipher) -> Self {
        Self {
            version: CIPHER_CONFIG_VERSION,
            alphabet: cipher.alphabet().as_string(),
            key: cipher.alphabet().render(cipher.key()),
            operation_mode: cipher.operation_mode(),
            displacement: cipher.displacement(),
            metacipher: cipher.metacipher().clone(),
            offset_metacipher: cipher.offset_metacipher().clone(),
            iv_gen_len: cipher.iv_gen_len(),
            output_format: cipher.output_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metacipher::DisplacementMode;
    use crate::output::OutputFormat;

    #[test]
    fn json_roundtrip() {
        let mut config = CipherConfig::default();
        config.key = "secret".to_string();
        config.displacement = DisplacementParams::new(DisplacementMode::Binary, 2, 0x7);
        let encoded = serde_json::to_string_pretty(&config).unwrap();
        let decoded: CipherConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn stale_version_is_rejected() {
        let mut config = CipherConfig::default();
        config.version = 99;
        let encoded = serde_json::to_string(&config).unwrap();
        let err = serde_json::from_str::<CipherConfig>(&encoded).unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn duplicate_metacipher_mains_are_rejected_on_load() {
        let encoded = r#"{
            "version": 1,
            "alphabet": "abc",
            "key": "abc",
            "operation_mode": "Single",
            "displacement": { "mode": "TruncatedBinary", "constant": 1, "mask": 15 },
            "metacipher": [
                { "main_offset": 0, "secondary_offsets": [1] },
                { "main_offset": 0, "secondary_offsets": [2] }
            ],
            "offset_metacipher": [],
            "iv_gen_len": 16,
            "output_format": "Values"
        }"#;
        let err = serde_json::from_str::<CipherConfig>(encoded).unwrap_err();
        assert!(err.to_string().contains("duplicate main offset"));
    }

    #[test]
    fn build_applies_every_field() {
        let mut config = CipherConfig::default();
        config.alphabet = "0123456789".to_string();
        config.key = "314159".to_string();
        config.operation_mode = OperationMode::Continuous;
        config.output_format = OutputFormat::Text;
        config.iv_gen_len = 8;
        let cipher = config.build().unwrap();
        assert_eq!(cipher.alphabet().len(), 10);
        assert_eq!(cipher.operation_mode(), OperationMode::Continuous);
        assert_eq!(cipher.output_format(), OutputFormat::Text);
        assert_eq!(cipher.iv_gen_len(), 8);
        assert_eq!(&cipher.state()[..5], &[3, 1, 4, 5, 9]);
    }

    #[test]
    fn profile_extraction_roundtrips() {
        let mut cipher = ShuffleCipher::new();
        cipher.set_key("secret");
        cipher.set_operation_mode(OperationMode::SingleWithLastIv);
        let config = CipherConfig::from_cipher(&cipher);
        let rebuilt = config.build().unwrap();
        assert_eq!(rebuilt.state(), cipher.state());
        assert_eq!(rebuilt.operation_mode(), cipher.operation_mode());
    }

    #[test]
    fn invalid_alphabet_fails_to_build() {
        let mut config = CipherConfig::default();
        config.alphabet = "aa".to_string();
        assert_eq!(
            config.build().unwrap_err(),
            ShuffleError::DuplicateSymbol { symbol: 'a' }
        );
    }
}
