// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Bucket hashing and table sizing.

const FNV_OFFSET_BASIS_32: u32 = 2_166_136_261;
const FNV_PRIME_32: u32 = 16_777_619;

/// 32-bit FNV-1a over the bytes of `key`.
pub fn fnv1a_32(key: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS_32;
    for byte in key {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME_32);
    }
    hash
}

/// Bucket index of `name` in a table of `size` buckets.
///
/// `size` is never zero for a constructed table.
pub fn bucket_index(name: &str, size: usize) -> usize {
    fnv1a_32(name.as_bytes()) as usize % size
}

pub fn is_prime(n: usize) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime `>= n`.
pub fn next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut candidate = if n % 2 == 0 { n + 1 } else { n };
    while !is_prime(candidate) {
        candidate += 2;
    }
    candidate
}

/// Bucket count for a requested size: at least `min_size`, rounded up to a
/// prime.
pub fn table_size(requested: usize, min_size: usize) -> usize {
    next_prime(requested.max(min_size))
}
