use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;

use crate::fetcher::{fill_chunk, ChunkEnd};

const HASH_BLOCK_SIZE: usize = 8192;

/// Hex SHA-256 of the file at `filepath`, read in fixed blocks.
pub async fn file_sha256(filepath: &Path) -> std::io::Result<String> {
    let mut file = File::open(filepath).await?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; HASH_BLOCK_SIZE];

    loop {
        let (len, end) = fill_chunk(&mut file, &mut block, false).await;
        hasher.update(&block[..len]);
        match end {
            ChunkEnd::Full => {}
            ChunkEnd::Eof => break,
            ChunkEnd::Failed(e) => return Err(e),
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn digest_matches(expected: &str, computed: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.bin");
        std::fs::write(&path, b"abc").unwrap();

        let digest = file_sha256(&path).await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(digest_matches(
            " BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD ",
            &digest
        ));
        assert!(!digest_matches("00", &digest));
    }

    #[tokio::test]
    async fn test_sha256_spans_multiple_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zeros.bin");
        std::fs::write(&path, vec![0u8; HASH_BLOCK_SIZE * 2 + 17]).unwrap();

        let expected = hex::encode(Sha256::digest(vec![0u8; HASH_BLOCK_SIZE * 2 + 17]));
        assert_eq!(file_sha256(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_sha256(&dir.path().join("absent.bin")).await.is_err());
    }
}
