//! The metacipher round engine.
//!
//! A round runs in two phases over a materialized transfer list. Phase 1
//! reads the state as it stands at round entry and records one transfer
//! per configuration entry; Phase 2 applies those transfers in entry
//! order against the mutating state, re-resolving operand and target
//! positions as it goes. Both ends of a transmission replay the same
//! phases from the same pivot, which is what keeps their states in step
//! without ever exchanging them. Folding the phases into one loop would
//! leak mid-round mutations into the reads and break that symmetry.

use crate::metacipher::{DisplacementMode, DisplacementParams, MetaCipherConfig};
use crate::state::PermutationState;

/// One recorded relocation: `operand` moves next to `target`, shifted by
/// `displacement` (finalized per mode in the apply phase).
#[derive(Clone, Copy, Debug)]
struct Transfer {
    operand: usize,
    target: usize,
    displacement: i64,
}

/// Mutates `state` by one round around `pivot`.
pub fn advance(
    state: &mut PermutationState,
    config: &MetaCipherConfig,
    offset_config: &MetaCipherConfig,
    pivot: usize,
    params: &DisplacementParams,
) {
    let transfers = compute_transfers(state, config, offset_config, pivot, params.mode);
    apply_transfers(state, &transfers, params);
}

fn compute_transfers(
    state: &PermutationState,
    config: &MetaCipherConfig,
    offset_config: &MetaCipherConfig,
    pivot: usize,
    mode: DisplacementMode,
) -> Vec<Transfer> {
    let klen = state.len() as u64;
    let mut transfers = Vec::with_capacity(config.len());
    for entry in config.entries() {
        let pos = state.wrap(pivot as i64 + entry.main_offset);
        let operand = state.value_at(pos);
        let mut target_sum: u64 = 0;
        let mut bits: u64 = 0;
        for &offset in &entry.secondary_offsets {
            let value = state.value_at(state.wrap(pos as i64 + offset));
            let previous = state.value_at(state.wrap(pos as i64 + offset - 1));
            target_sum += value as u64;
            bits = bits.wrapping_shl(1) | u64::from(value > previous);
        }
        let target = (target_sum % klen) as usize;
        let displacement = if mode == DisplacementMode::SeparateMetaCipher {
            separate_displacement(state, offset_config, entry.main_offset, pos)
        } else {
            bits as i64
        };
        transfers.push(Transfer {
            operand,
            target,
            displacement,
        });
    }
    transfers
}

/// Displacement drawn from the offset configuration: the sum of the
/// matching entry's state values, reduced mod klen after each matching
/// entry. No matching entry leaves the displacement at 0.
fn separate_displacement(
    state: &PermutationState,
    offset_config: &MetaCipherConfig,
    main_offset: i64,
    pos: usize,
) -> i64 {
    let klen = state.len() as i64;
    let mut displacement: i64 = 0;
    for entry in offset_config
        .entries()
        .iter()
        .filter(|entry| entry.main_offset == main_offset)
    {
        for &offset in &entry.secondary_offsets {
            displacement += state.value_at(state.wrap(pos as i64 + offset)) as i64;
        }
        displacement = displacement.rem_euclid(klen);
    }
    displacement
}

fn apply_transfers(state: &mut PermutationState, transfers: &[Transfer], params: &DisplacementParams) {
    for transfer in transfers {
        let displacement = match params.mode {
            DisplacementMode::Constant => params.constant,
            DisplacementMode::Binary => params.constant.wrapping_add(transfer.displacement),
            DisplacementMode::TruncatedBinary => {
                params.constant.wrapping_add(transfer.displacement) & params.mask as i64
            }
            DisplacementMode::SeparateMetaCipher => transfer.displacement,
        };
        let target_position = state.wrap(state.position_of(transfer.target) as i64 + displacement);
        state.move_value(transfer.operand, target_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(klen: usize) -> PermutationState {
        PermutationState::from_order((0..klen).collect())
    }

    #[test]
    fn stock_round_from_identity_state() {
        let mut state = identity(26);
        let config = MetaCipherConfig::standard();
        let offsets = MetaCipherConfig::standard_offsets();
        advance(
            &mut state,
            &config,
            &offsets,
            0,
            &DisplacementParams::default(),
        );
        let mut expected: Vec<usize> = (1..7).collect();
        expected.push(0);
        expected.extend(7..26);
        assert_eq!(state.as_slice(), expected.as_slice());
    }

    #[test]
    fn round_preserves_permutation() {
        let mut state = identity(26);
        let config = MetaCipherConfig::standard();
        let offsets = MetaCipherConfig::standard_offsets();
        for pivot in 0..26 {
            advance(
                &mut state,
                &config,
                &offsets,
                pivot,
                &DisplacementParams::default(),
            );
            assert!(state.is_permutation());
        }
    }

    #[test]
    fn missing_offset_entry_behaves_like_zero_displacement() {
        let config = MetaCipherConfig::standard();
        let empty = MetaCipherConfig::new();
        let mut separate = identity(26);
        advance(
            &mut separate,
            &config,
            &empty,
            4,
            &DisplacementParams::new(DisplacementMode::SeparateMetaCipher, 1, 0xf),
        );
        let mut constant_zero = identity(26);
        advance(
            &mut constant_zero,
            &config,
            &empty,
            4,
            &DisplacementParams::new(DisplacementMode::Constant, 0, 0xf),
        );
        assert_eq!(separate, constant_zero);
    }

    #[test]
    fn truncated_binary_masks_the_sum() {
        // constant 15 plus bits 3 wraps to 2 under the 0xf mask; masking
        // the bits alone before adding would give 18.
        let config = MetaCipherConfig::standard();
        let offsets = MetaCipherConfig::standard_offsets();
        let mut masked = identity(26);
        advance(
            &mut masked,
            &config,
            &offsets,
            0,
            &DisplacementParams::new(DisplacementMode::TruncatedBinary, 15, 0xf),
        );
        let mut plain = identity(26);
        advance(
            &mut plain,
            &config,
            &offsets,
            0,
            &DisplacementParams::new(DisplacementMode::Binary, -1, 0xf),
        );
        // (15 + 3) & 0xf == 2 == -1 + 3 for both entries of the stock
        // configuration, so the two runs land in the same state.
        assert_eq!(masked, plain);
    }

    #[test]
    fn negative_constant_wraps_into_range() {
        let config = MetaCipherConfig::standard();
        let offsets = MetaCipherConfig::standard_offsets();
        let mut state = identity(26);
        advance(
            &mut state,
            &config,
            &offsets,
            7,
            &DisplacementParams::new(DisplacementMode::Constant, -40, 0xf),
        );
        assert!(state.is_permutation());
    }

    #[test]
    fn empty_config_leaves_state_untouched() {
        let mut state = identity(26);
        let before = state.clone();
        advance(
            &mut state,
            &MetaCipherConfig::new(),
            &MetaCipherConfig::new(),
            3,
            &DisplacementParams::default(),
        );
        assert_eq!(state, before);
    }
}
