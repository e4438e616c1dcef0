//! The cipher instance: stream transforms plus mode and IV control.

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::error::ShuffleError;
use crate::metacipher::{
    random_modest_config, random_wide_config, DisplacementMode, DisplacementParams,
    MetaCipherConfig, ModestRandomParams, WideRandomParams,
};
use crate::output::{render, render_text, render_values, OutputFormat, StreamItem, TransformOutput};
use crate::rng::{random_iv, secure_rng};
use crate::round;
use crate::state::PermutationState;

/// Length of auto-generated initialization vectors.
pub const DEFAULT_IV_LEN: usize = 16;

/// What happens before each encrypt or decrypt call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationMode {
    /// Keep the state from the previous call.
    Continuous,
    /// Reset from the key; no IV.
    Single,
    /// Reset, then re-apply the most recent IV (a random one is generated
    /// and remembered if none exists yet).
    SingleWithLastIv,
    /// Reset, then generate, apply, and remember a fresh random IV.
    SingleWithRandomIv,
}

/// Console feedback switches. Feedback goes through the `log` macros;
/// the rendered return value is controlled separately by the cipher's
/// output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedbackSettings {
    pub print_ivs: bool,
    pub print_state: bool,
    pub print_messages: bool,
    pub print_format: OutputFormat,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            print_ivs: true,
            print_state: false,
            print_messages: true,
            print_format: OutputFormat::Text,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// A symmetric substitution cipher whose substitution table reshuffles
/// itself after every symbol.
///
/// Encryption looks the plaintext value up in the permutation state,
/// emits the value one slot to its right, and then mutates the state by
/// one metacipher round pivoted on that position. Decryption looks the
/// ciphertext value up, emits the value one slot to its left, and rounds
/// on that same pivot, so both ends walk through identical state
/// histories without exchanging state.
///
/// An instance exclusively owns its state; `Clone` yields an independent
/// deep copy. Calls on one instance must be serialized by the caller.
#[derive(Clone, Debug)]
pub struct ShuffleCipher {
    alphabet: Alphabet,
    key: Vec<usize>,
    state: PermutationState,
    metacipher: MetaCipherConfig,
    offset_metacipher: MetaCipherConfig,
    displacement: DisplacementParams,
    op_mode: OperationMode,
    iv: Option<Vec<usize>>,
    iv_gen_len: usize,
    feedback: FeedbackSettings,
    output_format: OutputFormat,
}

impl Default for ShuffleCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl ShuffleCipher {
    /// A cipher over the lowercase alphabet with the identity key and the
    /// stock metacipher configuration.
    pub fn new() -> Self {
        Self::with_alphabet(Alphabet::lowercase())
    }

    /// A cipher over `alphabet` with the identity key.
    pub fn with_alphabet(alphabet: Alphabet) -> Self {
        let key: Vec<usize> = (0..alphabet.len()).collect();
        let state = PermutationState::from_order(key.clone());
        Self {
            alphabet,
            key,
            state,
            metacipher: MetaCipherConfig::standard(),
            offset_metacipher: MetaCipherConfig::standard_offsets(),
            displacement: DisplacementParams::default(),
            op_mode: OperationMode::Single,
            iv: None,
            iv_gen_len: DEFAULT_IV_LEN,
            feedback: FeedbackSettings::default(),
            output_format: OutputFormat::Values,
        }
    }

    /// Schedules a new key and rebuilds the state from it.
    ///
    /// Symbols outside the alphabet are dropped and reported through the
    /// log; the remainder is deduplicated and padded with the missing
    /// alphabet symbols in lexical order.
    pub fn set_key(&mut self, key: &str) {
        let (order, rejected) = self.alphabet.normalize_key(key);
        for symbol in &rejected {
            warn!("undefined symbol in key: {symbol:?}");
        }
        if !rejected.is_empty() {
            warn!("alphabet: {}", self.alphabet.as_string());
        }
        debug!("key scheduled over {} symbols", order.len());
        self.key = order.clone();
        self.state = PermutationState::from_order(order);
    }

    /// Rebuilds the state from the stored key.
    pub fn reset(&mut self) {
        self.state = PermutationState::from_order(self.key.clone());
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The normalized key order the state resets to.
    pub fn key(&self) -> &[usize] {
        &self.key
    }

    /// The current permutation state.
    pub fn state(&self) -> &[usize] {
        self.state.as_slice()
    }

    /// The most recently applied IV, if any.
    pub fn iv(&self) -> Option<&[usize]> {
        self.iv.as_deref()
    }

    pub fn operation_mode(&self) -> OperationMode {
        self.op_mode
    }

    pub fn set_operation_mode(&mut self, mode: OperationMode) {
        self.op_mode = mode;
    }

    pub fn displacement(&self) -> DisplacementParams {
        self.displacement
    }

    pub fn set_displacement(&mut self, params: DisplacementParams) {
        self.displacement = params;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn feedback(&self) -> FeedbackSettings {
        self.feedback
    }

    pub fn set_feedback(&mut self, settings: FeedbackSettings) {
        self.feedback = settings;
    }

    pub fn iv_gen_len(&self) -> usize {
        self.iv_gen_len
    }

    pub fn set_iv_gen_len(&mut self, len: usize) {
        self.iv_gen_len = len;
    }

    pub fn metacipher(&self) -> &MetaCipherConfig {
        &self.metacipher
    }

    pub fn offset_metacipher(&self) -> &MetaCipherConfig {
        &self.offset_metacipher
    }

    pub fn set_metacipher(&mut self, config: MetaCipherConfig) {
        self.metacipher = config;
    }

    pub fn set_offset_metacipher(&mut self, config: MetaCipherConfig) {
        self.offset_metacipher = config;
    }

    pub fn define_metacipher(&mut self, main_offset: i64, offsets: &[i64]) {
        self.metacipher.define(main_offset, offsets);
    }

    pub fn remove_metacipher(&mut self, main_offset: i64) {
        self.metacipher.remove(main_offset);
    }

    pub fn define_offset_metacipher(&mut self, main_offset: i64, offsets: &[i64]) {
        self.offset_metacipher.define(main_offset, offsets);
    }

    pub fn remove_offset_metacipher(&mut self, main_offset: i64) {
        self.offset_metacipher.remove(main_offset);
    }

    /// Replaces both configurations with modest random draws (main
    /// offsets 0 and 1), each drawn independently.
    pub fn randomize_modest(&mut self, params: &ModestRandomParams) {
        let mut rng = secure_rng();
        self.randomize_modest_with_rng(params, &mut rng);
    }

    pub fn randomize_modest_with_rng<R: Rng + ?Sized>(
        &mut self,
        params: &ModestRandomParams,
        rng: &mut R,
    ) {
        self.metacipher = random_modest_config(params, rng);
        self.offset_metacipher = random_modest_config(params, rng);
        self.log_metacipher();
    }

    /// Replaces both configurations with wide random draws, each drawn
    /// independently (including the extra main offsets).
    pub fn randomize_wide(&mut self, params: &WideRandomParams) {
        let mut rng = secure_rng();
        self.randomize_wide_with_rng(params, &mut rng);
    }

    pub fn randomize_wide_with_rng<R: Rng + ?Sized>(
        &mut self,
        params: &WideRandomParams,
        rng: &mut R,
    ) {
        self.metacipher = random_wide_config(params, rng);
        self.offset_metacipher = random_wide_config(params, rng);
        self.log_metacipher();
    }

    fn log_metacipher(&self) {
        info!("MC : {:?}", self.metacipher.entries());
        if self.displacement.mode == DisplacementMode::SeparateMetaCipher {
            info!("OMC: {:?}", self.offset_metacipher.entries());
        }
    }

    /// Applies an explicit IV: records it as most recent and folds it
    /// into the state.
    pub fn apply_iv_values(&mut self, iv: &[usize]) -> Result<(), ShuffleError> {
        self.validate_values(iv)?;
        self.apply_iv_unchecked(iv.to_vec());
        Ok(())
    }

    /// Applies an IV given as symbol text; every symbol must be defined.
    pub fn apply_iv_text(&mut self, iv: &str) -> Result<(), ShuffleError> {
        let values = self.alphabet.values_strict(iv)?;
        self.apply_iv_unchecked(values);
        Ok(())
    }

    /// Generates, applies, and remembers a random IV, returning it so the
    /// caller can share it with the other end.
    pub fn apply_random_iv(&mut self) -> Vec<usize> {
        let mut rng = secure_rng();
        self.apply_random_iv_with_rng(&mut rng)
    }

    pub fn apply_random_iv_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<usize> {
        let iv = random_iv(self.iv_gen_len, self.alphabet.len(), rng);
        self.apply_iv_unchecked(iv.clone());
        iv
    }

    fn apply_iv_unchecked(&mut self, iv: Vec<usize>) {
        if self.feedback.print_ivs {
            match self.feedback.print_format {
                OutputFormat::Text => info!("IV : {}", self.alphabet.render(&iv)),
                OutputFormat::Values => info!("IV : {:?}", iv),
            }
        }
        self.iv = Some(iv.clone());
        self.digest_values_internal(&iv);
    }

    /// Encrypts symbol text. Symbols outside the alphabet pass through
    /// unchanged and leave the state alone.
    pub fn encrypt_text(&mut self, plaintext: &str) -> TransformOutput {
        self.prepare_transform();
        self.log_state();
        let items = self.text_items(plaintext);
        let result = self.transform(&items, Direction::Encrypt);
        debug!("encrypt len={} mode={:?}", items.len(), self.op_mode);
        self.finish_transform(&result)
    }

    /// Encrypts raw lexical values.
    pub fn encrypt_values(&mut self, plaintext: &[usize]) -> Result<TransformOutput, ShuffleError> {
        self.validate_values(plaintext)?;
        self.prepare_transform();
        self.log_state();
        let items: Vec<StreamItem> = plaintext.iter().map(|&v| StreamItem::Value(v)).collect();
        let result = self.transform(&items, Direction::Encrypt);
        debug!("encrypt len={} mode={:?}", items.len(), self.op_mode);
        Ok(self.finish_transform(&result))
    }

    /// Decrypts symbol text produced by [`encrypt_text`](Self::encrypt_text).
    pub fn decrypt_text(&mut self, ciphertext: &str) -> TransformOutput {
        self.prepare_transform();
        self.log_state();
        let items = self.text_items(ciphertext);
        let result = self.transform(&items, Direction::Decrypt);
        debug!("decrypt len={} mode={:?}", items.len(), self.op_mode);
        self.finish_transform(&result)
    }

    /// Decrypts raw lexical values.
    pub fn decrypt_values(&mut self, ciphertext: &[usize]) -> Result<TransformOutput, ShuffleError> {
        self.validate_values(ciphertext)?;
        self.prepare_transform();
        self.log_state();
        let items: Vec<StreamItem> = ciphertext.iter().map(|&v| StreamItem::Value(v)).collect();
        let result = self.transform(&items, Direction::Decrypt);
        debug!("decrypt len={} mode={:?}", items.len(), self.op_mode);
        Ok(self.finish_transform(&result))
    }

    /// Feeds text through the round machinery without producing output.
    /// Symbols outside the alphabet are skipped. The mode controller does
    /// not run; digestion always acts on the state as it stands.
    pub fn digest_text(&mut self, data: &str) {
        for symbol in data.chars() {
            if let Some(value) = self.alphabet.value_of(symbol) {
                let pivot = self.state.position_of(value);
                self.run_round(pivot);
            }
        }
    }

    /// Feeds raw lexical values through the round machinery.
    pub fn digest_values(&mut self, data: &[usize]) -> Result<(), ShuffleError> {
        self.validate_values(data)?;
        self.digest_values_internal(data);
        Ok(())
    }

    fn digest_values_internal(&mut self, data: &[usize]) {
        for &value in data {
            let pivot = self.state.position_of(value);
            self.run_round(pivot);
        }
    }

    fn text_items(&self, text: &str) -> Vec<StreamItem> {
        text.chars()
            .map(|symbol| match self.alphabet.value_of(symbol) {
                Some(value) => StreamItem::Value(value),
                None => StreamItem::Literal(symbol),
            })
            .collect()
    }

    fn transform(&mut self, items: &[StreamItem], direction: Direction) -> Vec<StreamItem> {
        let klen = self.state.len();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match *item {
                StreamItem::Literal(symbol) => out.push(StreamItem::Literal(symbol)),
                StreamItem::Value(value) => {
                    let pos = self.state.position_of(value);
                    let (emit_pos, pivot) = match direction {
                        Direction::Encrypt => ((pos + 1) % klen, pos),
                        Direction::Decrypt => {
                            let pt_pos = self.state.wrap(pos as i64 - 1);
                            (pt_pos, pt_pos)
                        }
                    };
                    out.push(StreamItem::Value(self.state.value_at(emit_pos)));
                    self.run_round(pivot);
                }
            }
        }
        out
    }

    fn run_round(&mut self, pivot: usize) {
        round::advance(
            &mut self.state,
            &self.metacipher,
            &self.offset_metacipher,
            pivot,
            &self.displacement,
        );
    }

    /// The mode controller, evaluated once per encrypt/decrypt call.
    fn prepare_transform(&mut self) {
        match self.op_mode {
            OperationMode::Continuous => {}
            OperationMode::Single => self.reset(),
            OperationMode::SingleWithLastIv => {
                self.reset();
                match self.iv.clone() {
                    Some(iv) => self.apply_iv_unchecked(iv),
                    None => {
                        self.apply_random_iv();
                    }
                }
            }
            OperationMode::SingleWithRandomIv => {
                self.reset();
                self.apply_random_iv();
            }
        }
    }

    fn finish_transform(&mut self, items: &[StreamItem]) -> TransformOutput {
        self.log_message(items);
        self.log_state();
        render(&self.alphabet, items, self.output_format)
    }

    fn log_state(&self) {
        if !self.feedback.print_state {
            return;
        }
        match self.feedback.print_format {
            OutputFormat::Text => info!("STA: {}", self.alphabet.render(self.state.as_slice())),
            OutputFormat::Values => info!("STA: {:?}", self.state.as_slice()),
        }
    }

    fn log_message(&self, items: &[StreamItem]) {
        if !self.feedback.print_messages {
            return;
        }
        match self.feedback.print_format {
            OutputFormat::Text => info!("MSG: {}", render_text(&self.alphabet, items)),
            OutputFormat::Values => info!("MSG: {:?}", render_values(items)),
        }
    }

    fn validate_values(&self, values: &[usize]) -> Result<(), ShuffleError> {
        let klen = self.alphabet.len();
        for &value in values {
            if value >= klen {
                return Err(ShuffleError::ValueOutOfRange { value, klen });
            }
        }
        Ok(())
    }
}
