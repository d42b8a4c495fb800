// SPDX-License-Identifier: MIT
//
// Revision 6 (AES-256) standard security handler values.
//
// Unlike the legacy revisions the file key is random, not password
// derived. The passwords gate access to it: /U and /O hold validation
// hashes, /UE and /OE hold the file key wrapped under keys derived from
// the respective password, and /Perms holds the permission word sealed
// under the file key so a reader can detect tampering with the plaintext
// /P entry.

use rand::RngCore;
use sha2::{Digest, Sha256, Sha384, Sha512};

use quire_core::error::Result;

use crate::aes::{aes128_cbc_encrypt_raw, aes256_cbc_encrypt_raw, aes256_ecb_encrypt_block};

/// Passwords are UTF-8 and capped at 127 bytes before hashing.
const MAX_PASSWORD_BYTES: usize = 127;

/// The complete set of handler values for one protected document.
pub struct HandlerValues {
    /// Random 32-byte file encryption key; every string and stream is
    /// encrypted directly under it.
    pub file_key: [u8; 32],
    /// 48-byte /U entry: validation hash plus two salts.
    pub u: [u8; 48],
    /// 32-byte /UE entry: file key wrapped under the user password.
    pub ue: [u8; 32],
    /// 48-byte /O entry.
    pub o: [u8; 48],
    /// 32-byte /OE entry.
    pub oe: [u8; 32],
    /// 16-byte /Perms entry.
    pub perms: [u8; 16],
}

/// Derive all revision 6 values from the two passwords and the permission
/// word. `encrypt_metadata` lands in the /Perms block as 'T' or 'F'.
pub fn derive(
    user_password: &str,
    owner_password: &str,
    permissions: i32,
    encrypt_metadata: bool,
) -> Result<HandlerValues> {
    let mut rng = rand::thread_rng();

    let mut file_key = [0u8; 32];
    rng.fill_bytes(&mut file_key);

    let user = truncate_password(user_password);
    let owner = truncate_password(owner_password);

    // User values first; /O hashes over the finished /U entry.
    let mut user_salts = [0u8; 16];
    rng.fill_bytes(&mut user_salts);
    let (validation_salt, key_salt) = user_salts.split_at(8);

    let mut u = [0u8; 48];
    u[..32].copy_from_slice(&password_hash(&user, validation_salt, &[])?);
    u[32..40].copy_from_slice(validation_salt);
    u[40..48].copy_from_slice(key_salt);

    let intermediate = password_hash(&user, key_salt, &[])?;
    let mut ue = [0u8; 32];
    ue.copy_from_slice(&aes256_cbc_encrypt_raw(&intermediate, &[0u8; 16], &file_key)?);

    let mut owner_salts = [0u8; 16];
    rng.fill_bytes(&mut owner_salts);
    let (validation_salt, key_salt) = owner_salts.split_at(8);

    let mut o = [0u8; 48];
    o[..32].copy_from_slice(&password_hash(&owner, validation_salt, &u)?);
    o[32..40].copy_from_slice(validation_salt);
    o[40..48].copy_from_slice(key_salt);

    let intermediate = password_hash(&owner, key_salt, &u)?;
    let mut oe = [0u8; 32];
    oe.copy_from_slice(&aes256_cbc_encrypt_raw(&intermediate, &[0u8; 16], &file_key)?);

    let perms = perms_block(&file_key, permissions, encrypt_metadata, &mut rng)?;

    Ok(HandlerValues {
        file_key,
        u,
        ue,
        o,
        oe,
        perms,
    })
}

/// The hardened SHA-2 password hash (Algorithm 2.B).
///
/// Starts from SHA-256 of password, salt and (for owner values) the /U
/// entry, then iterates: build 64 concatenated copies of password, current
/// hash and the extra data, AES-128-CBC encrypt them under the first 32
/// bytes of the hash, and rehash with SHA-256/384/512 chosen by the first
/// block's byte sum modulo 3. At least 64 rounds run; after that the loop
/// ends once the last ciphertext byte is at most `round - 32`.
fn password_hash(password: &[u8], salt: &[u8], udata: &[u8]) -> Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(udata);
    let mut k: Vec<u8> = hasher.finalize().to_vec();

    let mut round = 0usize;
    loop {
        // 64 repeats keep the block aligned whatever the input lengths.
        let chunk = password.len() + k.len() + udata.len();
        let mut k1 = Vec::with_capacity(64 * chunk);
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(udata);
        }

        let e = aes128_cbc_encrypt_raw(&k[..16], &k[16..32], &k1)?;

        let selector: u32 = e[..16].iter().map(|&byte| u32::from(byte)).sum();
        k = match selector % 3 {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        let last = e[e.len() - 1] as usize;
        if round >= 64 && last <= round - 32 {
            break;
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&k[..32]);
    Ok(out)
}

/// Build and seal the /Perms block: the permission word little-endian,
/// four reserved 0xFF bytes, the metadata flag, the literal `adb` marker
/// and four random bytes, ECB-encrypted under the file key.
fn perms_block(
    file_key: &[u8; 32],
    permissions: i32,
    encrypt_metadata: bool,
    rng: &mut impl RngCore,
) -> Result<[u8; 16]> {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&permissions.to_le_bytes());
    block[4..8].copy_from_slice(&[0xFF; 4]);
    block[8] = if encrypt_metadata { b'T' } else { b'F' };
    block[9..12].copy_from_slice(b"adb");
    rng.fill_bytes(&mut block[12..16]);

    aes256_ecb_encrypt_block(file_key, &block)
}

fn truncate_password(password: &str) -> Vec<u8> {
    let bytes = password.as_bytes();
    if bytes.len() <= MAX_PASSWORD_BYTES {
        return bytes.to_vec();
    }
    // Cut on a character boundary below the cap.
    let mut end = MAX_PASSWORD_BYTES;
    while end > 0 && !password.is_char_boundary(end) {
        end -= 1;
    }
    bytes[..end].to_vec()
}
