//! SHA-1 compression via x86-64 SHA extensions.
//!
//! `SHA1RNDS4` advances the packed a/b/c/d state four rounds at a time;
//! `SHA1NEXTE` derives the next e value from the a that entered the
//! previous four rounds. The message schedule runs two steps ahead of
//! the round groups so every `w` register is rewritten only after its
//! last use.

use core::arch::x86_64::*;

/// Compresses whole 64-byte blocks into the running state.
///
/// Only reachable through the capability probe in `kernel`, which
/// guarantees the `sha`, `ssse3` and `sse4.1` features are present.
pub(crate) fn compress(state: &mut [u32; 5], blocks: &[u8]) {
    debug_assert_eq!(blocks.len() % 64, 0);
    unsafe { compress_blocks(state, blocks) }
}

#[inline]
#[target_feature(enable = "sha,sse2,ssse3,sse4.1")]
unsafe fn schedule(v0: __m128i, v1: __m128i, v2: __m128i, v3: __m128i) -> __m128i {
    _mm_sha1msg2_epu32(_mm_xor_si128(_mm_sha1msg1_epu32(v0, v1), v2), v3)
}

#[target_feature(enable = "sha,sse2,ssse3,sse4.1")]
unsafe fn compress_blocks(state: &mut [u32; 5], blocks: &[u8]) {
    // Lane-reversal mask turning big-endian message bytes into the word
    // order the SHA instructions expect.
    let flip = _mm_set_epi64x(0x0001_0203_0405_0607, 0x0809_0a0b_0c0d_0e0f);

    let mut abcd = _mm_set_epi32(
        state[0] as i32,
        state[1] as i32,
        state[2] as i32,
        state[3] as i32,
    );
    let mut e = _mm_set_epi32(state[4] as i32, 0, 0, 0);

    for block in blocks.chunks_exact(64) {
        let abcd_save = abcd;
        let e_save = e;

        let p = block.as_ptr() as *const __m128i;
        let mut w0 = _mm_shuffle_epi8(_mm_loadu_si128(p), flip);
        let mut w1 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(1)), flip);
        let mut w2 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(2)), flip);
        let mut w3 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(3)), flip);

        // Rounds 0..16
        let mut h0 = abcd;
        let mut h1 = _mm_sha1rnds4_epu32(h0, _mm_add_epi32(e, w0), 0);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w1), 0);
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w2), 0);
        w0 = schedule(w0, w1, w2, w3);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w3), 0);
        w1 = schedule(w1, w2, w3, w0);

        // Rounds 16..32
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w0), 0);
        w2 = schedule(w2, w3, w0, w1);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w1), 1);
        w3 = schedule(w3, w0, w1, w2);
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w2), 1);
        w0 = schedule(w0, w1, w2, w3);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w3), 1);
        w1 = schedule(w1, w2, w3, w0);

        // Rounds 32..48
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w0), 1);
        w2 = schedule(w2, w3, w0, w1);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w1), 1);
        w3 = schedule(w3, w0, w1, w2);
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w2), 2);
        w0 = schedule(w0, w1, w2, w3);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w3), 2);
        w1 = schedule(w1, w2, w3, w0);

        // Rounds 48..64
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w0), 2);
        w2 = schedule(w2, w3, w0, w1);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w1), 2);
        w3 = schedule(w3, w0, w1, w2);
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w2), 2);
        w0 = schedule(w0, w1, w2, w3);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w3), 3);
        w1 = schedule(w1, w2, w3, w0);

        // Rounds 64..80
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w0), 3);
        w2 = schedule(w2, w3, w0, w1);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w1), 3);
        w3 = schedule(w3, w0, w1, w2);
        h1 = _mm_sha1rnds4_epu32(h0, _mm_sha1nexte_epu32(h1, w2), 3);
        h0 = _mm_sha1rnds4_epu32(h1, _mm_sha1nexte_epu32(h0, w3), 3);

        e = _mm_sha1nexte_epu32(h1, e_save);
        abcd = _mm_add_epi32(h0, abcd_save);
    }

    state[0] = _mm_extract_epi32(abcd, 3) as u32;
    state[1] = _mm_extract_epi32(abcd, 2) as u32;
    state[2] = _mm_extract_epi32(abcd, 1) as u32;
    state[3] = _mm_extract_epi32(abcd, 0) as u32;
    state[4] = _mm_extract_epi32(e, 3) as u32;
}
