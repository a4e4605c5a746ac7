//! Random invite codes for domains.

use grove_core::domain::JOIN_CODE_LEN;
use rand_core::{OsRng, RngCore as _};

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the charset length that fits in a byte; bytes at or
/// above it are redrawn so every character is equally likely.
const ACCEPT_BELOW: u8 = (256 / CHARSET.len() * CHARSET.len()) as u8;

pub fn generate() -> String {
  let mut code = String::with_capacity(JOIN_CODE_LEN);
  let mut buf = [0u8; 16];
  while code.len() < JOIN_CODE_LEN {
    OsRng.fill_bytes(&mut buf);
    for &b in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
      if code.len() == JOIN_CODE_LEN {
        break;
      }
      code.push(CHARSET[b as usize % CHARSET.len()] as char);
    }
  }
  code
}
