// paysync-server/src/security.rs

/// Byte-for-byte, case-sensitive comparison whose running time does not
/// depend on where the inputs first differ.
pub fn tokens_match(presented: &str, expected: &str) -> bool {
  if presented.len() != expected.len() {
    return false;
  }
  presented
    .bytes()
    .zip(expected.bytes())
    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
    == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_tokens_match() {
    assert!(tokens_match("s3cret-token", "s3cret-token"));
    assert!(tokens_match("", ""));
  }

  #[test]
  fn differing_tokens_do_not_match() {
    assert!(!tokens_match("s3cret-tokem", "s3cret-token"));
    assert!(!tokens_match("S3CRET-TOKEN", "s3cret-token"));
    assert!(!tokens_match("x3cret-token", "s3cret-token"));
  }

  #[test]
  fn length_mismatch_does_not_match() {
    assert!(!tokens_match("s3cret", "s3cret-token"));
    assert!(!tokens_match("s3cret-token-extra", "s3cret-token"));
    assert!(!tokens_match("", "s3cret-token"));
  }
}
