// SPDX-License-Identifier: MIT
//
// Thin AES-CBC and AES-ECB wrappers over the RustCrypto block ciphers.
// PDF uses CBC with PKCS#7 padding for string and stream content, CBC
// without padding inside the revision 6 password hash, and a single ECB
// block for the /Perms value.

use aes::cipher::{BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::{Decryptor, Encryptor};
use quire_core::error::{EngineError, Result};

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;
type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

fn check_iv(iv: &[u8]) -> Result<()> {
    if iv.len() != 16 {
        return Err(EngineError::Internal(format!(
            "AES IV must be 16 bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let padding = 16 - (data.len() % 16);
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(padding as u8).take(padding));
    padded
}

fn pkcs7_unpad(mut data: Vec<u8>) -> Result<Vec<u8>> {
    let padding = match data.last() {
        Some(&byte) if (1..=16).contains(&(byte as usize)) => byte as usize,
        _ => return Err(EngineError::Internal("invalid PKCS#7 padding".into())),
    };
    if data.len() < padding {
        return Err(EngineError::Internal("invalid PKCS#7 padding".into()));
    }
    let split = data.len() - padding;
    if data[split..].iter().any(|&byte| byte as usize != padding) {
        return Err(EngineError::Internal("invalid PKCS#7 padding".into()));
    }
    data.truncate(split);
    Ok(data)
}

/// AES-128-CBC with PKCS#7 padding.
pub fn aes128_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(EngineError::Internal(format!(
            "AES-128 key must be 16 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;

    let mut buffer = pkcs7_pad(data);
    let len = buffer.len();
    Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-128 cipher setup failed".into()))?
        .encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer, len)
        .map_err(|_| EngineError::Internal("AES-128 encryption failed".into()))?;
    Ok(buffer)
}

/// AES-256-CBC with PKCS#7 padding.
pub fn aes256_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(EngineError::Internal(format!(
            "AES-256 key must be 32 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;

    let mut buffer = pkcs7_pad(data);
    let len = buffer.len();
    Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-256 cipher setup failed".into()))?
        .encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer, len)
        .map_err(|_| EngineError::Internal("AES-256 encryption failed".into()))?;
    Ok(buffer)
}

/// AES-256-CBC without padding. Input length must already be a multiple of
/// the block size; used for the key-wrapping /UE and /OE values.
pub fn aes256_cbc_encrypt_raw(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(EngineError::Internal(format!(
            "AES-256 key must be 32 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    if data.len() % 16 != 0 {
        return Err(EngineError::Internal(
            "unpadded AES input must be block aligned".into(),
        ));
    }

    let mut buffer = data.to_vec();
    let len = buffer.len();
    Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-256 cipher setup failed".into()))?
        .encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer, len)
        .map_err(|_| EngineError::Internal("AES-256 encryption failed".into()))?;
    Ok(buffer)
}

/// AES-128-CBC without padding, for the revision 6 password hash rounds.
pub fn aes128_cbc_encrypt_raw(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(EngineError::Internal(format!(
            "AES-128 key must be 16 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    if data.len() % 16 != 0 {
        return Err(EngineError::Internal(
            "unpadded AES input must be block aligned".into(),
        ));
    }

    let mut buffer = data.to_vec();
    let len = buffer.len();
    Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-128 cipher setup failed".into()))?
        .encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer, len)
        .map_err(|_| EngineError::Internal("AES-128 encryption failed".into()))?;
    Ok(buffer)
}

/// Encrypt exactly one 16-byte block with AES-256 in ECB mode, as the
/// /Perms entry requires.
pub fn aes256_ecb_encrypt_block(key: &[u8], block: &[u8; 16]) -> Result<[u8; 16]> {
    if key.len() != 32 {
        return Err(EngineError::Internal(format!(
            "AES-256 key must be 32 bytes, got {}",
            key.len()
        )));
    }
    let cipher = Aes256::new_from_slice(key)
        .map_err(|_| EngineError::Internal("AES-256 cipher setup failed".into()))?;
    let mut output = aes::Block::clone_from_slice(block);
    cipher.encrypt_block(&mut output);
    let mut result = [0u8; 16];
    result.copy_from_slice(&output);
    Ok(result)
}

/// AES-128-CBC decryption with PKCS#7 removal. Test support for the
/// encryption round trips.
pub fn aes128_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(EngineError::Internal(format!(
            "AES-128 key must be 16 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    if data.is_empty() || data.len() % 16 != 0 {
        return Err(EngineError::Internal(
            "ciphertext length must be a positive multiple of 16".into(),
        ));
    }

    let mut buffer = data.to_vec();
    Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-128 cipher setup failed".into()))?
        .decrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer)
        .map_err(|_| EngineError::Internal("AES-128 decryption failed".into()))?;
    pkcs7_unpad(buffer)
}

/// AES-256-CBC decryption with PKCS#7 removal.
pub fn aes256_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(EngineError::Internal(format!(
            "AES-256 key must be 32 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    if data.is_empty() || data.len() % 16 != 0 {
        return Err(EngineError::Internal(
            "ciphertext length must be a positive multiple of 16".into(),
        ));
    }

    let mut buffer = data.to_vec();
    Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| EngineError::Internal("AES-256 cipher setup failed".into()))?
        .decrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buffer)
        .map_err(|_| EngineError::Internal("AES-256 decryption failed".into()))?;
    pkcs7_unpad(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY128: &[u8; 16] = b"0123456789abcdef";
    const KEY256: &[u8; 32] = b"0123456789abcdef0123456789abcdef";
    const IV: &[u8; 16] = b"fedcba9876543210";

    #[test]
    fn aes128_round_trip() {
        let plaintext = b"some stream content, not block aligned";
        let ciphertext = aes128_cbc_encrypt(KEY128, IV, plaintext).unwrap();
        assert_eq!(ciphertext.len() % 16, 0);
        let decrypted = aes128_cbc_decrypt(KEY128, IV, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes256_round_trip() {
        let plaintext = b"longer key, same plumbing";
        let ciphertext = aes256_cbc_encrypt(KEY256, IV, plaintext).unwrap();
        let decrypted = aes256_cbc_decrypt(KEY256, IV, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn block_aligned_input_gains_full_padding_block() {
        let plaintext = [7u8; 32];
        let ciphertext = aes128_cbc_encrypt(KEY128, IV, &plaintext).unwrap();
        assert_eq!(ciphertext.len(), 48);
    }

    #[test]
    fn raw_mode_rejects_unaligned_input() {
        assert!(aes256_cbc_encrypt_raw(KEY256, IV, b"seventeen bytes!!").is_err());
        assert!(aes256_cbc_encrypt_raw(KEY256, IV, &[0u8; 32]).is_ok());
    }

    #[test]
    fn short_keys_are_rejected() {
        assert!(aes128_cbc_encrypt(b"short", IV, b"data").is_err());
        assert!(aes256_cbc_encrypt(KEY128, IV, b"data").is_err());
    }

    #[test]
    fn ecb_block_is_deterministic() {
        let block = [0x42u8; 16];
        let a = aes256_ecb_encrypt_block(KEY256, &block).unwrap();
        let b = aes256_ecb_encrypt_block(KEY256, &block).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, block);
    }
}
