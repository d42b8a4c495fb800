// SPDX-License-Identifier: MIT
//
// Password protection and permission encoding.
//
// Implements the PDF standard security handler on the write side only:
// revision 3 (RC4-128), revision 4 (AES-128) and revision 6 (AES-256).
// The encoder derives the handler values, encrypts every string and stream
// in the document and installs the /Encrypt dictionary; it never decrypts,
// so already encrypted input is rejected upstream.
//
// Permission flags restrain compliant readers only. The encryption makes
// the bytes unreadable without the password, but a reader that ignores the
// permission bits can do anything the password exposes. Callers surface
// that caveat to end users.

pub mod aes;
pub mod aes256;
pub mod encoder;
pub mod legacy;
pub mod permissions;
pub mod rc4;

pub use encoder::protect;
pub use permissions::encode_permissions;
