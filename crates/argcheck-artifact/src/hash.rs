//! Content hashing for candidate ids

/// A 32-byte Blake3 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash over several parts
    ///
    /// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
    /// never collide.
    #[must_use]
    pub fn compute_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// First 16 hex chars
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_length_prefixed() {
        let a = ContentHash::compute_parts(&[b"ab", b"c"]);
        let b = ContentHash::compute_parts(&[b"a", b"bc"]);
        assert_ne!(a, b);
        assert_eq!(a, ContentHash::compute_parts(&[b"ab", b"c"]));
        assert_eq!(a.short().len(), 16);
    }

    proptest::proptest! {
        #[test]
        fn splitting_parts_changes_the_hash(a in ".{1,16}", b in ".{1,16}") {
            let joined = format!("{a}{b}");
            let whole = ContentHash::compute_parts(&[joined.as_bytes()]);
            let split = ContentHash::compute_parts(&[a.as_bytes(), b.as_bytes()]);
            proptest::prop_assert_ne!(whole, split);
        }
    }
}
