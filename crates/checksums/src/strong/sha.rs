//! crates/checksums/src/strong/sha.rs
//!
//! SHA family digests backed by RustCrypto.

use digest::Digest;

use super::StrongDigest;

macro_rules! sha_hasher {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name {
            inner: $inner,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }

        impl $name {
            /// Creates a hasher with an empty state.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    inner: <$inner>::new(),
                }
            }

            /// Feeds additional bytes into the digest state.
            pub fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            /// Finalises the digest.
            #[must_use]
            pub fn finalize(self) -> [u8; $len] {
                let mut output = [0_u8; $len];
                output.copy_from_slice(&self.inner.finalize());
                output
            }

            /// Computes the digest of `data` in one shot.
            #[must_use]
            pub fn digest(data: &[u8]) -> [u8; $len] {
                <Self as StrongDigest>::digest(data)
            }
        }

        impl StrongDigest for $name {
            type Digest = [u8; $len];
            const DIGEST_LEN: usize = $len;

            fn new() -> Self {
                $name::new()
            }

            fn update(&mut self, data: &[u8]) {
                self.update(data);
            }

            fn finalize(self) -> Self::Digest {
                self.finalize()
            }
        }
    };
}

sha_hasher!(
    /// Streaming SHA-1 hasher.
    Sha1,
    sha1::Sha1,
    20
);

sha_hasher!(
    /// Streaming SHA-256 hasher, the default block digest.
    Sha256,
    sha2::Sha256,
    32
);

sha_hasher!(
    /// Streaming SHA-512 hasher.
    Sha512,
    sha2::Sha512,
    64
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strong::to_hex;

    #[test]
    fn sha256_empty_input_matches_known_vector() {
        assert_eq!(
            to_hex(&Sha256::digest(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_abc_matches_known_vector() {
        assert_eq!(
            to_hex(&Sha256::digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha1_abc_matches_known_vector() {
        assert_eq!(
            to_hex(&Sha1::digest(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn sha512_digest_len() {
        assert_eq!(Sha512::digest(b"abc").len(), Sha512::DIGEST_LEN);
        assert_eq!(Sha512::DIGEST_LEN, 64);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Sha256::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), Sha256::digest(b"hello world"));
    }
}
