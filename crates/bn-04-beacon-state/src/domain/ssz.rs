//! # SSZ Field Hashers
//!
//! Hash-tree-root functions for every value type stored in the beacon state.
//!
//! ## Algorithm: Binary Merkleization
//!
//! Values are split into 32-byte chunks and merkleized as a binary tree with
//! SHA-256: `parent = H(left || right)`. Trees are virtually padded to a power
//! of two with zero subtrees, so a list bounded by a large limit (2^40
//! validators) never allocates its padding. Lists mix their length into the
//! root: `H(root || len_le_u64)`.
//!
//! ## Parallelism
//!
//! Element roots of large composite lists are computed with rayon above
//! `PARALLEL_THRESHOLD`, sequentially below it. Both paths give the same root.

use super::{
    AggregationBits, AttestationData, BeaconBlockHeader, Checkpoint, Eth1Data, Fork, Hash,
    HashError, JustificationBits, PendingAttestation, ValidationError, Validator, Version,
    JUSTIFICATION_BITS_LENGTH, ZERO_HASH,
};
use lazy_static::lazy_static;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

pub const BYTES_PER_CHUNK: usize = 32;

/// Deepest tree representable with a `usize` leaf limit.
pub const MAX_MERKLE_DEPTH: usize = 64;

/// Parallel threshold - use sequential hashing for smaller lists.
pub const PARALLEL_THRESHOLD: usize = 1024;

const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;
const U64S_PER_CHUNK: usize = BYTES_PER_CHUNK / 8;

lazy_static! {
    /// `ZERO_HASHES[d]` is the root of a depth-`d` tree of zero chunks.
    pub static ref ZERO_HASHES: [Hash; MAX_MERKLE_DEPTH + 1] = {
        let mut hashes = [ZERO_HASH; MAX_MERKLE_DEPTH + 1];
        for depth in 1..=MAX_MERKLE_DEPTH {
            hashes[depth] = hash_pair(&hashes[depth - 1], &hashes[depth - 1]);
        }
        hashes
    };
}

pub fn hash(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// `H(left || right)`
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Number of levels above the leaves for a tree holding `limit` chunks.
pub fn merkle_depth(limit: usize) -> Result<usize, HashError> {
    limit
        .max(1)
        .checked_next_power_of_two()
        .map(|width| width.trailing_zeros() as usize)
        .ok_or(HashError::DepthExceeded {
            limit,
            max: MAX_MERKLE_DEPTH,
        })
}

/// Merkleize `chunks` into a tree sized for `limit` chunks.
pub fn merkleize(chunks: &[Hash], limit: usize) -> Result<Hash, HashError> {
    if chunks.len() > limit {
        return Err(ValidationError::ListTooLong {
            limit,
            actual: chunks.len(),
        }
        .into());
    }
    let depth = merkle_depth(limit)?;
    Ok(merkleize_to_depth(chunks, depth))
}

/// Merkleize a fixed set of container field roots.
pub fn merkleize_fixed(chunks: &[Hash]) -> Hash {
    let depth = chunks.len().max(1).next_power_of_two().trailing_zeros() as usize;
    merkleize_to_depth(chunks, depth)
}

/// Caller guarantees `chunks.len() <= 2^depth`.
fn merkleize_to_depth(chunks: &[Hash], depth: usize) -> Hash {
    if chunks.is_empty() {
        return ZERO_HASHES[depth];
    }

    let mut layer = chunks.to_vec();
    for level in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(ZERO_HASHES[level]);
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    layer[0]
}

pub fn mix_in_length(root: &Hash, length: usize) -> Hash {
    let mut length_chunk = ZERO_HASH;
    length_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    hash_pair(root, &length_chunk)
}

/// Right-pad raw bytes into 32-byte chunks.
pub fn pack_bytes(bytes: &[u8]) -> Vec<Hash> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|piece| {
            let mut chunk = ZERO_HASH;
            chunk[..piece.len()].copy_from_slice(piece);
            chunk
        })
        .collect()
}

/// Pack little-endian u64s, four per chunk.
pub fn pack_u64s(values: &[u64]) -> Vec<Hash> {
    values
        .chunks(U64S_PER_CHUNK)
        .map(|group| {
            let mut chunk = ZERO_HASH;
            for (slot, value) in group.iter().enumerate() {
                chunk[slot * 8..slot * 8 + 8].copy_from_slice(&value.to_le_bytes());
            }
            chunk
        })
        .collect()
}

// =============================================================================
// BASIC TYPES
// =============================================================================

pub fn uint64_root(value: u64) -> Hash {
    let mut chunk = ZERO_HASH;
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    chunk
}

pub fn bool_root(value: bool) -> Hash {
    let mut chunk = ZERO_HASH;
    chunk[0] = value as u8;
    chunk
}

fn version_root(version: &Version) -> Hash {
    let mut chunk = ZERO_HASH;
    chunk[..4].copy_from_slice(version);
    chunk
}

/// A 48-byte BLS public key spans two chunks.
pub fn pubkey_root(pubkey: &[u8; 48]) -> Hash {
    merkleize_fixed(&pack_bytes(pubkey))
}

// =============================================================================
// CONTAINERS
// =============================================================================

pub fn fork_root(fork: &Fork) -> Hash {
    merkleize_fixed(&[
        version_root(&fork.previous_version),
        version_root(&fork.current_version),
        uint64_root(fork.epoch),
    ])
}

pub fn checkpoint_root(checkpoint: &Checkpoint) -> Hash {
    merkleize_fixed(&[uint64_root(checkpoint.epoch), checkpoint.root])
}

pub fn block_header_root(header: &BeaconBlockHeader) -> Hash {
    merkleize_fixed(&[
        uint64_root(header.slot),
        header.parent_root,
        header.state_root,
        header.body_root,
    ])
}

pub fn eth1_data_root(data: &Eth1Data) -> Hash {
    merkleize_fixed(&[
        data.deposit_root,
        uint64_root(data.deposit_count),
        data.block_hash,
    ])
}

pub fn validator_root(validator: &Validator) -> Hash {
    merkleize_fixed(&[
        pubkey_root(&validator.pubkey),
        validator.withdrawal_credentials,
        uint64_root(validator.effective_balance),
        bool_root(validator.slashed),
        uint64_root(validator.activation_eligibility_epoch),
        uint64_root(validator.activation_epoch),
        uint64_root(validator.exit_epoch),
        uint64_root(validator.withdrawable_epoch),
    ])
}

pub fn attestation_data_root(data: &AttestationData) -> Hash {
    merkleize_fixed(&[
        uint64_root(data.slot),
        uint64_root(data.index),
        data.beacon_block_root,
        checkpoint_root(&data.source),
        checkpoint_root(&data.target),
    ])
}

pub fn pending_attestation_root(
    attestation: &PendingAttestation,
    max_validators_per_committee: usize,
) -> Result<Hash, HashError> {
    Ok(merkleize_fixed(&[
        bitlist_root(&attestation.aggregation_bits, max_validators_per_committee)?,
        attestation_data_root(&attestation.data),
        uint64_root(attestation.inclusion_delay),
        uint64_root(attestation.proposer_index),
    ]))
}

// =============================================================================
// BITFIELDS
// =============================================================================

/// Root of a `Bitlist[limit]`. The length delimiter bit is not part of the
/// merkleized data; the length is mixed in instead.
pub fn bitlist_root(bits: &AggregationBits, limit: usize) -> Result<Hash, HashError> {
    if bits.len() > limit {
        return Err(ValidationError::BitlistTooLong {
            limit,
            actual: bits.len(),
        }
        .into());
    }

    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for index in bits.iter_ones() {
        bytes[index / 8] |= 1 << (index % 8);
    }

    let root = merkleize(&pack_bytes(&bytes), limit.div_ceil(BITS_PER_CHUNK))?;
    Ok(mix_in_length(&root, bits.len()))
}

/// Root of the `Bitvector[4]` justification bits.
pub fn justification_bits_root(bits: &JustificationBits) -> Result<Hash, HashError> {
    let byte = bits.as_raw_slice()[0];
    if byte >> JUSTIFICATION_BITS_LENGTH != 0 {
        return Err(ValidationError::InvalidJustificationBits { bits: byte }.into());
    }
    let mut chunk = ZERO_HASH;
    chunk[0] = byte;
    Ok(chunk)
}

// =============================================================================
// COLLECTIONS
// =============================================================================

/// Root of a `Vector[Bytes32, length]`.
pub fn roots_vector_root(roots: &[Hash], length: usize) -> Result<Hash, HashError> {
    if roots.len() != length {
        return Err(ValidationError::VectorLength {
            expected: length,
            actual: roots.len(),
        }
        .into());
    }
    merkleize(roots, length)
}

/// Root of a `List[Bytes32, limit]`.
pub fn roots_list_root(roots: &[Hash], limit: usize) -> Result<Hash, HashError> {
    if roots.len() > limit {
        return Err(ValidationError::ListTooLong {
            limit,
            actual: roots.len(),
        }
        .into());
    }
    Ok(mix_in_length(&merkleize(roots, limit)?, roots.len()))
}

/// Root of a `Vector[uint64, length]`.
pub fn u64_vector_root(values: &[u64], length: usize) -> Result<Hash, HashError> {
    if values.len() != length {
        return Err(ValidationError::VectorLength {
            expected: length,
            actual: values.len(),
        }
        .into());
    }
    merkleize(&pack_u64s(values), length.div_ceil(U64S_PER_CHUNK))
}

/// Root of a `List[uint64, limit]`.
pub fn u64_list_root(values: &[u64], limit: usize) -> Result<Hash, HashError> {
    if values.len() > limit {
        return Err(ValidationError::ListTooLong {
            limit,
            actual: values.len(),
        }
        .into());
    }
    let root = merkleize(&pack_u64s(values), limit.div_ceil(U64S_PER_CHUNK))?;
    Ok(mix_in_length(&root, values.len()))
}

/// Root of a `List[T, limit]` of composite elements.
pub fn composite_list_root<T, F>(items: &[T], limit: usize, root_of: F) -> Result<Hash, HashError>
where
    T: Sync,
    F: Fn(&T) -> Result<Hash, HashError> + Send + Sync,
{
    if items.len() > limit {
        return Err(ValidationError::ListTooLong {
            limit,
            actual: items.len(),
        }
        .into());
    }

    let roots: Vec<Hash> = if items.len() < PARALLEL_THRESHOLD {
        items.iter().map(&root_of).collect::<Result<_, _>>()?
    } else {
        items.par_iter().map(&root_of).collect::<Result<_, _>>()?
    };

    Ok(mix_in_length(&merkleize(&roots, limit)?, items.len()))
}
