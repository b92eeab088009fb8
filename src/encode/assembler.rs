/// The finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Concatenated encoder output.
    pub data: Vec<u8>,
    /// Content-type tag (the configured mime type).
    pub mime_type: String,
}

impl Artifact {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the recording produced no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered fragment sequence for one session.
#[derive(Debug, Default)]
pub struct FragmentAssembler {
    fragments: Vec<Vec<u8>>,
    bytes: usize,
}

impl FragmentAssembler {
    /// An empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment in arrival order. Zero-length fragments are dropped.
    pub fn push(&mut self, fragment: Vec<u8>) -> bool {
        if fragment.is_empty() {
            return false;
        }
        self.bytes += fragment.len();
        self.fragments.push(fragment);
        true
    }

    /// Number of retained fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total retained bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes
    }

    /// Concatenate the sequence into one artifact tagged with `mime_type`.
    pub fn finish(self, mime_type: impl Into<String>) -> Artifact {
        let mut data = Vec::with_capacity(self.bytes);
        for f in self.fragments {
            data.extend_from_slice(&f);
        }
        Artifact {
            data,
            mime_type: mime_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragments_are_discarded() {
        let mut a = FragmentAssembler::new();
        assert!(!a.push(Vec::new()));
        assert!(a.push(vec![1; 500]));
        assert!(!a.push(Vec::new()));
        assert_eq!(a.fragment_count(), 1);
        assert_eq!(a.finish("video/mp4").len(), 500);
    }

    #[test]
    fn concatenation_preserves_arrival_order() {
        let mut a = FragmentAssembler::new();
        a.push(vec![1, 2]);
        a.push(vec![3]);
        a.push(vec![4, 5, 6]);
        assert_eq!(a.byte_len(), 6);
        let art = a.finish("video/webm");
        assert_eq!(art.data, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(art.mime_type, "video/webm");
    }
}
