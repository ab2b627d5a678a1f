//! SHA-1 compute kernel (FIPS 180-4).
//!
//! Each [`Sha1Kernel`] owns a reusable scratch buffer: the input is
//! copied in, padded in place, and compressed as one contiguous run of
//! 64-byte blocks. Two compression variants exist, a portable scalar one
//! and an x86-64 SHA-NI one; the variant is probed once per process and
//! produces bit-identical output.

use std::sync::OnceLock;

/// Compresses whole 64-byte blocks into the running state.
pub(crate) type CompressFn = fn(&mut [u32; 5], &[u8]);

const INITIAL_STATE: [u32; 5] = [
    0x6745_2301,
    0xEFCD_AB89,
    0x98BA_DCFE,
    0x1032_5476,
    0xC3D2_E1F0,
];

/// Worst-case padding tail: 0x80, 63 zero bytes, 8 length bytes.
const MAX_PADDING: usize = 72;

/// A SHA-1 hasher with its own scratch memory.
///
/// The scratch grows to the largest input hashed so far, so a kernel
/// that repeatedly hashes pieces of the same size never reallocates.
/// Instances are cheap to create but not thread-safe; the worker pool
/// hands each one to at most one job at a time.
pub struct Sha1Kernel {
    compress: CompressFn,
    scratch: Vec<u8>,
}

impl Sha1Kernel {
    /// Creates a kernel using the best compression variant the CPU
    /// supports.
    pub fn new() -> Self {
        Self::with_compress(detect_compress())
    }

    /// Creates a kernel whose scratch is preallocated for inputs up to
    /// `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut kernel = Self::new();
        kernel.scratch.reserve(capacity + MAX_PADDING);
        kernel
    }

    /// Creates a kernel with an explicit compression variant.
    ///
    /// Used by tests to compare variants; production callers go through
    /// [`Sha1Kernel::new`].
    pub(crate) fn with_compress(compress: CompressFn) -> Self {
        Self {
            compress,
            scratch: Vec::new(),
        }
    }

    /// Computes the SHA-1 digest of `data`.
    pub fn hash(&mut self, data: &[u8]) -> [u8; 20] {
        let padded = padded_len(data.len());
        self.scratch.clear();
        self.scratch.reserve(padded);
        self.scratch.extend_from_slice(data);

        // Padding: 0x80, zeros until the length ≡ 56 (mod 64), then the
        // message length in bits as a 64-bit big-endian integer.
        self.scratch.push(0x80);
        self.scratch.resize(padded - 8, 0);
        let bit_len = (data.len() as u64) * 8;
        self.scratch.extend_from_slice(&bit_len.to_be_bytes());

        let mut state = INITIAL_STATE;
        (self.compress)(&mut state, &self.scratch);

        let mut digest = [0u8; 20];
        for (chunk, word) in digest.chunks_exact_mut(4).zip(state) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        digest
    }
}

impl Default for Sha1Kernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the SHA-1 digest of `data` with a one-off kernel.
///
/// Convenience for small inputs like an encoded `info` dictionary; the
/// piece pipeline reuses pooled kernels instead.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1Kernel::new().hash(data)
}

/// Total message length after padding: the smallest multiple of 64 that
/// fits the data, the 0x80 marker, and the 8 length bytes.
fn padded_len(len: usize) -> usize {
    (len + 9).div_ceil(64) * 64
}

/// Picks the compression variant once per process.
pub(crate) fn detect_compress() -> CompressFn {
    static COMPRESS: OnceLock<CompressFn> = OnceLock::new();
    *COMPRESS.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        if is_x86_feature_detected!("sha")
            && is_x86_feature_detected!("ssse3")
            && is_x86_feature_detected!("sse4.1")
        {
            return super::sha_ni::compress as CompressFn;
        }
        compress_scalar as CompressFn
    })
}

/// Portable SHA-1 compression.
pub(crate) fn compress_scalar(state: &mut [u32; 5], blocks: &[u8]) {
    debug_assert_eq!(blocks.len() % 64, 0);
    let mut w = [0u32; 80];

    for block in blocks.chunks_exact(64) {
        for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        for i in 16..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = *state;
        for (i, &word) in w.iter().enumerate() {
            let (f, k) = match i {
                0..=19 => ((b & c) | (!b & d), 0x5A82_7999u32),
                20..=39 => (b ^ c ^ d, 0x6ED9_EBA1),
                40..=59 => ((b & c) | (b & d) | (c & d), 0x8F1B_BCDC),
                _ => (b ^ c ^ d, 0xCA62_C1D6),
            };
            let temp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
        state[4] = state[4].wrapping_add(e);
    }
}
