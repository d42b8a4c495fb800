// SPDX-License-Identifier: MIT
//
// Key derivation for the legacy standard security handler revisions 3 and
// 4 (RC4-128 and AES-128). All of it is MD5 and RC4 churn over padded
// passwords, exactly as the handler defines it.

use md5::{Digest, Md5};

use crate::rc4::rc4_crypt;

/// Standard 32-byte password padding.
pub const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// 128-bit file keys throughout; revision 2's 40-bit keys are not written.
pub const KEY_LENGTH: usize = 16;

/// Pad or truncate a password to exactly 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD[..32 - len]);
    padded
}

/// Compute the /O entry from the owner and user passwords.
///
/// Fifty MD5 rounds over the padded owner password produce an RC4 key,
/// which then encrypts the padded user password twenty times with the key
/// bytes XORed by the iteration index.
pub fn owner_value(owner_password: &[u8], user_password: &[u8]) -> [u8; 32] {
    let source = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };

    let mut hash = Md5::digest(pad_password(source)).to_vec();
    for _ in 0..50 {
        hash = Md5::digest(&hash[..KEY_LENGTH]).to_vec();
    }
    let rc4_key = &hash[..KEY_LENGTH];

    let mut value = rc4_crypt(rc4_key, &pad_password(user_password));
    for i in 1..=19u8 {
        let round_key: Vec<u8> = rc4_key.iter().map(|byte| byte ^ i).collect();
        value = rc4_crypt(&round_key, &value);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&value);
    out
}

/// Derive the file encryption key from the user password.
///
/// `revision` is 3 or 4; for revision 4 with metadata left in the clear an
/// extra all-ones word enters the hash, but we always encrypt metadata so
/// the flag stays true.
pub fn file_key(
    user_password: &[u8],
    owner_value: &[u8; 32],
    permissions: i32,
    file_id: &[u8],
    revision: u8,
    encrypt_metadata: bool,
) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(pad_password(user_password));
    hasher.update(owner_value);
    hasher.update(permissions.to_le_bytes());
    hasher.update(file_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = hasher.finalize().to_vec();

    for _ in 0..50 {
        hash = Md5::digest(&hash[..KEY_LENGTH]).to_vec();
    }

    let mut key = [0u8; 16];
    key.copy_from_slice(&hash[..KEY_LENGTH]);
    key
}

/// Compute the /U entry for revisions 3 and 4.
///
/// MD5 of the padding string plus the file identifier, RC4-encrypted
/// twenty times with XOR-stepped keys, then padded out to 32 bytes with
/// zeros (the last 16 bytes are arbitrary per the handler).
pub fn user_value(file_key: &[u8; 16], file_id: &[u8]) -> [u8; 32] {
    let mut hasher = Md5::new();
    hasher.update(PAD);
    hasher.update(file_id);
    let mut hash = hasher.finalize().to_vec();

    for i in 0..20u8 {
        let round_key: Vec<u8> = file_key.iter().map(|byte| byte ^ i).collect();
        hash = rc4_crypt(&round_key, &hash);
    }

    let mut value = [0u8; 32];
    value[..16].copy_from_slice(&hash);
    value
}

/// Derive the per-object key for string and stream encryption.
///
/// MD5 over the file key, the low three bytes of the object number and the
/// low two bytes of the generation number; AES additionally salts with the
/// literal bytes `sAlT`. The object key length is `min(n + 5, 16)`.
pub fn object_key(file_key: &[u8; 16], object_id: (u32, u16), aes: bool) -> Vec<u8> {
    let (number, generation) = object_id;
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&number.to_le_bytes()[..3]);
    hasher.update(generation.to_le_bytes());
    if aes {
        hasher.update(b"sAlT");
    }
    let hash = hasher.finalize();

    let key_len = (file_key.len() + 5).min(16);
    hash[..key_len].to_vec()
}
