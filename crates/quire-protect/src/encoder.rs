// SPDX-License-Identifier: MIT
//
// Protection encoder. Derives the standard security handler values for
// the requested level, encrypts every string and stream in the document,
// and installs the /Encrypt dictionary and file identifier.

use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};
use rand::{rngs::ThreadRng, RngCore};
use tracing::{info, instrument, warn};

use quire_core::error::{EngineError, Result};
use quire_core::human_errors::PERMISSIONS_ARE_POLICY_NOTE;
use quire_core::types::{EncryptionLevel, ProtectionMode, ProtectionSettings};
use quire_document::EditableDocument;

use crate::aes::{aes128_cbc_encrypt, aes256_cbc_encrypt};
use crate::legacy;
use crate::permissions::encode_permissions;
use crate::rc4::rc4_crypt;

/// The cipher applied to individual strings and streams, carrying the key
/// material its revision needs.
enum Cipher {
    Rc4 { file_key: [u8; 16] },
    Aes128 { file_key: [u8; 16] },
    Aes256 { file_key: [u8; 32] },
}

impl Cipher {
    fn encrypt(&self, object_id: ObjectId, data: &[u8], rng: &mut ThreadRng) -> Result<Vec<u8>> {
        match self {
            Cipher::Rc4 { file_key } => {
                let key = legacy::object_key(file_key, object_id, false);
                Ok(rc4_crypt(&key, data))
            }
            Cipher::Aes128 { file_key } => {
                let key = legacy::object_key(file_key, object_id, true);
                let iv = random_iv(rng);
                let mut output = iv.to_vec();
                output.extend(aes128_cbc_encrypt(&key, &iv, data)?);
                Ok(output)
            }
            Cipher::Aes256 { file_key } => {
                let iv = random_iv(rng);
                let mut output = iv.to_vec();
                output.extend(aes256_cbc_encrypt(file_key, &iv, data)?);
                Ok(output)
            }
        }
    }
}

/// Apply the requested protection to a finished document, in place.
///
/// This is the last mutation before serialization: everything after it
/// would be encrypted with stale keys. The trailer gains a fresh /ID and
/// an /Encrypt reference; every string and stream in the object table is
/// replaced with ciphertext under a per-object (revisions 3 and 4) or
/// file-wide (revision 6) key.
#[instrument(skip(document, settings), fields(level = ?settings.level, mode = ?settings.mode))]
pub fn protect(document: &mut EditableDocument, settings: &ProtectionSettings) -> Result<()> {
    if settings.level == EncryptionLevel::None {
        info!("Protection level none, leaving document unencrypted");
        return Ok(());
    }

    if document.was_encrypted() || document.inner().trailer.has(b"Encrypt") {
        return Err(EngineError::EncryptionUnsupported(
            "document is already encrypted; re-encryption is not supported".into(),
        ));
    }

    match settings.mode {
        ProtectionMode::FullProtection => {
            if settings.user_password.is_empty() {
                return Err(EngineError::PasswordRequired(
                    "full protection requires a user password".into(),
                ));
            }
        }
        ProtectionMode::PermissionsOnly => {
            if !settings.user_password.is_empty() {
                return Err(EngineError::EncryptionUnsupported(
                    "permissions-only protection opens without a prompt; \
                     the user password must be empty"
                        .into(),
                ));
            }
            if settings.effective_owner_password().is_empty() {
                return Err(EngineError::PasswordRequired(
                    "permissions-only protection requires an owner password".into(),
                ));
            }
            warn!("{}", PERMISSIONS_ARE_POLICY_NOTE);
        }
    }

    let mut rng = rand::thread_rng();
    let permissions = encode_permissions(&settings.permissions);

    let mut file_id = [0u8; 16];
    rng.fill_bytes(&mut file_id);

    let user_password = settings.user_password.as_bytes();
    let owner_password = settings.effective_owner_password().as_bytes().to_vec();

    let (cipher, encrypt_dict) = match settings.level {
        EncryptionLevel::None => unreachable!("handled above"),
        EncryptionLevel::Rc4_128 => {
            let o = legacy::owner_value(&owner_password, user_password);
            let key = legacy::file_key(user_password, &o, permissions, &file_id, 3, true);
            let u = legacy::user_value(&key, &file_id);
            let dict = dictionary! {
                "Filter" => "Standard",
                "V" => 2,
                "R" => 3,
                "Length" => 128,
                "P" => i64::from(permissions),
                "O" => Object::String(o.to_vec(), StringFormat::Hexadecimal),
                "U" => Object::String(u.to_vec(), StringFormat::Hexadecimal),
            };
            (Cipher::Rc4 { file_key: key }, dict)
        }
        EncryptionLevel::Aes128 => {
            let o = legacy::owner_value(&owner_password, user_password);
            let key = legacy::file_key(user_password, &o, permissions, &file_id, 4, true);
            let u = legacy::user_value(&key, &file_id);
            let dict = dictionary! {
                "Filter" => "Standard",
                "V" => 4,
                "R" => 4,
                "Length" => 128,
                "P" => i64::from(permissions),
                "O" => Object::String(o.to_vec(), StringFormat::Hexadecimal),
                "U" => Object::String(u.to_vec(), StringFormat::Hexadecimal),
                "CF" => dictionary! {
                    "StdCF" => dictionary! {
                        "Type" => "CryptFilter",
                        "CFM" => "AESV2",
                        "AuthEvent" => "DocOpen",
                        "Length" => 16,
                    },
                },
                "StmF" => "StdCF",
                "StrF" => "StdCF",
                "EncryptMetadata" => true,
            };
            (Cipher::Aes128 { file_key: key }, dict)
        }
        EncryptionLevel::Aes256 => {
            let values = crate::aes256::derive(
                &settings.user_password,
                settings.effective_owner_password(),
                permissions,
                true,
            )?;
            let dict = dictionary! {
                "Filter" => "Standard",
                "V" => 5,
                "R" => 6,
                "Length" => 256,
                "P" => i64::from(permissions),
                "O" => Object::String(values.o.to_vec(), StringFormat::Hexadecimal),
                "U" => Object::String(values.u.to_vec(), StringFormat::Hexadecimal),
                "OE" => Object::String(values.oe.to_vec(), StringFormat::Hexadecimal),
                "UE" => Object::String(values.ue.to_vec(), StringFormat::Hexadecimal),
                "Perms" => Object::String(values.perms.to_vec(), StringFormat::Hexadecimal),
                "CF" => dictionary! {
                    "StdCF" => dictionary! {
                        "Type" => "CryptFilter",
                        "CFM" => "AESV3",
                        "AuthEvent" => "DocOpen",
                        "Length" => 32,
                    },
                },
                "StmF" => "StdCF",
                "StrF" => "StdCF",
                "EncryptMetadata" => true,
            };
            (
                Cipher::Aes256 {
                    file_key: values.file_key,
                },
                dict,
            )
        }
    };

    let doc = document.inner_mut();
    bump_version(doc, minimum_version(settings.level));

    // Encrypt the object table before the /Encrypt dictionary exists, so
    // the walk can cover every object unconditionally. The trailer is not
    // an object and keeps its /ID in the clear, as readers require.
    let mut encrypted = 0usize;
    for (&object_id, object) in doc.objects.iter_mut() {
        encrypted += encrypt_object(object, object_id, &cipher, &mut rng)?;
    }

    let encrypt_id = doc.add_object(Object::Dictionary(encrypt_dict));
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(file_id.to_vec(), StringFormat::Hexadecimal),
            Object::String(file_id.to_vec(), StringFormat::Hexadecimal),
        ]),
    );

    info!(encrypted, "Document protected");
    Ok(())
}

/// Recursively encrypt the strings and stream content inside one object.
/// Returns how many leaf values were rewritten.
fn encrypt_object(
    object: &mut Object,
    object_id: ObjectId,
    cipher: &Cipher,
    rng: &mut ThreadRng,
) -> Result<usize> {
    match object {
        Object::String(data, format) => {
            *data = cipher.encrypt(object_id, data, rng)?;
            // Ciphertext is binary whatever the original format was.
            *format = StringFormat::Hexadecimal;
            Ok(1)
        }
        Object::Array(items) => {
            let mut count = 0;
            for item in items {
                count += encrypt_object(item, object_id, cipher, rng)?;
            }
            Ok(count)
        }
        Object::Dictionary(dict) => {
            let mut count = 0;
            for (_, value) in dict.iter_mut() {
                count += encrypt_object(value, object_id, cipher, rng)?;
            }
            Ok(count)
        }
        Object::Stream(stream) => {
            let mut count = 1;
            let ciphertext = cipher.encrypt(object_id, &stream.content, rng)?;
            stream.set_content(ciphertext);
            for (_, value) in stream.dict.iter_mut() {
                count += encrypt_object(value, object_id, cipher, rng)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

fn random_iv(rng: &mut ThreadRng) -> [u8; 16] {
    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut iv);
    iv
}

/// Lowest PDF version whose readers understand the given level.
fn minimum_version(level: EncryptionLevel) -> &'static str {
    match level {
        EncryptionLevel::None => "1.4",
        EncryptionLevel::Rc4_128 => "1.4",
        EncryptionLevel::Aes128 => "1.6",
        EncryptionLevel::Aes256 => "2.0",
    }
}

fn bump_version(doc: &mut Document, minimum: &str) {
    // Version strings are "major.minor" with single digits for every PDF
    // release, so a lexicographic comparison is ordering-correct.
    if doc.version.as_str() < minimum {
        doc.version = minimum.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;
    use quire_core::types::{PermissionSet, PrintPermission};

    const MARKER: &[u8] = b"BT /F1 12 Tf 72 720 Td (Confidential) Tj ET";

    fn sample_document() -> EditableDocument {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            MARKER.to_vec(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly report".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", Object::Reference(info_id));

        EditableDocument::from_document(doc)
    }

    fn full_protection(level: EncryptionLevel) -> ProtectionSettings {
        ProtectionSettings {
            level,
            mode: ProtectionMode::FullProtection,
            user_password: "secret".into(),
            owner_password: Some("admin".into()),
            permissions: PermissionSet::default(),
        }
    }

    fn encrypt_dict(doc: &EditableDocument) -> &lopdf::Dictionary {
        let reference = doc.inner().trailer.get(b"Encrypt").unwrap();
        match reference {
            Object::Reference(id) => match doc.inner().get_object(*id) {
                Ok(Object::Dictionary(dict)) => dict,
                other => panic!("encrypt entry is not a dictionary: {other:?}"),
            },
            other => panic!("trailer /Encrypt is not a reference: {other:?}"),
        }
    }

    fn stream_contents(doc: &EditableDocument) -> Vec<Vec<u8>> {
        doc.inner()
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream) => Some(stream.content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rc4_writes_revision_three() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Rc4_128)).unwrap();

        let dict = encrypt_dict(&doc);
        assert_eq!(dict.get(b"V").unwrap().as_i64().unwrap(), 2);
        assert_eq!(dict.get(b"R").unwrap().as_i64().unwrap(), 3);
        assert_eq!(dict.get(b"Length").unwrap().as_i64().unwrap(), 128);
        // RC4 keeps lengths; content must still differ from the plaintext.
        for content in stream_contents(&doc) {
            assert_ne!(content, MARKER);
        }
    }

    #[test]
    fn aes128_writes_revision_four_with_crypt_filter() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Aes128)).unwrap();

        let dict = encrypt_dict(&doc);
        assert_eq!(dict.get(b"V").unwrap().as_i64().unwrap(), 4);
        assert_eq!(dict.get(b"R").unwrap().as_i64().unwrap(), 4);
        assert!(dict.get(b"CF").is_ok());
        assert_eq!(doc.version(), "1.6");

        // AES prepends a 16-byte IV and pads to the block size.
        for content in stream_contents(&doc) {
            assert!(content.len() >= 32);
            assert_eq!(content.len() % 16, 0);
        }
    }

    #[test]
    fn aes256_writes_revision_six_with_key_wrap_entries() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Aes256)).unwrap();

        let dict = encrypt_dict(&doc);
        assert_eq!(dict.get(b"V").unwrap().as_i64().unwrap(), 5);
        assert_eq!(dict.get(b"R").unwrap().as_i64().unwrap(), 6);
        assert_eq!(dict.get(b"Length").unwrap().as_i64().unwrap(), 256);
        for entry in [b"O".as_slice(), b"U", b"OE", b"UE", b"Perms"] {
            assert!(dict.get(entry).is_ok(), "missing {entry:?}");
        }
        assert_eq!(doc.version(), "2.0");
    }

    #[test]
    fn none_level_is_a_no_op() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            level: EncryptionLevel::None,
            mode: ProtectionMode::FullProtection,
            user_password: "secret".into(),
            owner_password: None,
            permissions: PermissionSet::default(),
        };
        protect(&mut doc, &settings).unwrap();
        assert!(doc.inner().trailer.get(b"Encrypt").is_err());
        assert_eq!(stream_contents(&doc)[0], MARKER);
    }

    #[test]
    fn full_protection_without_password_is_rejected() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            user_password: String::new(),
            owner_password: None,
            ..full_protection(EncryptionLevel::Aes256)
        };
        assert!(matches!(
            protect(&mut doc, &settings),
            Err(EngineError::PasswordRequired(_))
        ));
        // Failed validation leaves the document untouched.
        assert!(doc.inner().trailer.get(b"Encrypt").is_err());
    }

    #[test]
    fn permissions_only_requires_an_owner_password() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            level: EncryptionLevel::Aes128,
            mode: ProtectionMode::PermissionsOnly,
            user_password: String::new(),
            owner_password: None,
            permissions: PermissionSet::default(),
        };
        assert!(matches!(
            protect(&mut doc, &settings),
            Err(EngineError::PasswordRequired(_))
        ));
    }

    #[test]
    fn permissions_only_rejects_a_user_password() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            level: EncryptionLevel::Aes128,
            mode: ProtectionMode::PermissionsOnly,
            user_password: "secret".into(),
            owner_password: Some("admin".into()),
            permissions: PermissionSet::default(),
        };
        assert!(matches!(
            protect(&mut doc, &settings),
            Err(EngineError::EncryptionUnsupported(_))
        ));
    }

    #[test]
    fn permissions_only_encrypts_with_empty_user_password() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            level: EncryptionLevel::Rc4_128,
            mode: ProtectionMode::PermissionsOnly,
            user_password: String::new(),
            owner_password: Some("admin".into()),
            permissions: PermissionSet {
                printing: PrintPermission::HighRes,
                ..PermissionSet::default()
            },
        };
        protect(&mut doc, &settings).unwrap();

        let dict = encrypt_dict(&doc);
        // Restrictive mask even though the document opens without a prompt.
        assert!(dict.get(b"P").unwrap().as_i64().unwrap() < 0);
    }

    #[test]
    fn already_encrypted_input_is_rejected() {
        let mut doc = sample_document();
        doc.inner_mut()
            .trailer
            .set("Encrypt", Object::Reference((99, 0)));
        assert!(matches!(
            protect(&mut doc, &full_protection(EncryptionLevel::Aes128)),
            Err(EngineError::EncryptionUnsupported(_))
        ));
    }

    #[test]
    fn trailer_gains_a_file_identifier() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Rc4_128)).unwrap();
        match doc.inner().trailer.get(b"ID").unwrap() {
            Object::Array(parts) => assert_eq!(parts.len(), 2),
            other => panic!("trailer /ID is not an array: {other:?}"),
        }
    }

    fn saved(doc: &mut EditableDocument) -> Vec<u8> {
        let mut bytes = Vec::new();
        doc.inner_mut().save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn permissions_only_output_opens_and_decrypts() {
        for level in [
            EncryptionLevel::Rc4_128,
            EncryptionLevel::Aes128,
            EncryptionLevel::Aes256,
        ] {
            let mut doc = sample_document();
            let settings = ProtectionSettings {
                level,
                mode: ProtectionMode::PermissionsOnly,
                user_password: String::new(),
                owner_password: Some("admin".into()),
                permissions: PermissionSet::default(),
            };
            protect(&mut doc, &settings).unwrap();
            let bytes = saved(&mut doc);

            // An empty password must open the document, and the content
            // must decrypt back to the exact plaintext.
            let reloaded = Document::load_mem(&bytes).unwrap();
            assert!(reloaded.encryption_state.is_some(), "{level:?}");
            let decrypted = reloaded.objects.values().any(|object| {
                matches!(object, Object::Stream(stream) if stream.content == MARKER)
            });
            assert!(decrypted, "{level:?} content did not decrypt");
        }
    }

    #[test]
    fn full_protection_output_withholds_content_without_the_password() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Rc4_128)).unwrap();
        let bytes = saved(&mut doc);

        // Loading without the password must not expose the plaintext,
        // whether the parse is refused outright or yields an empty shell.
        match Document::load_mem(&bytes) {
            Ok(reloaded) => {
                assert!(reloaded.get_pages().is_empty());
                let leaked = reloaded.objects.values().any(|object| {
                    matches!(object, Object::Stream(stream) if stream.content == MARKER)
                });
                assert!(!leaked);
            }
            Err(_) => {}
        }
    }

    #[test]
    fn reloading_protected_output_sheds_the_stale_handler() {
        let mut doc = sample_document();
        let settings = ProtectionSettings {
            level: EncryptionLevel::Rc4_128,
            mode: ProtectionMode::PermissionsOnly,
            user_password: String::new(),
            owner_password: Some("admin".into()),
            permissions: PermissionSet::default(),
        };
        protect(&mut doc, &settings).unwrap();
        let bytes = saved(&mut doc);

        // A reparse decrypts in place; the wrapper must drop the handler
        // state so a later save writes the decrypted objects plainly
        // instead of reinstalling /Encrypt over plaintext.
        let reloaded = EditableDocument::from_bytes(&bytes).unwrap();
        assert!(reloaded.was_encrypted());
        assert!(reloaded.inner().trailer.get(b"Encrypt").is_err());
        assert!(reloaded.inner().encryption_state.is_none());
    }

    #[test]
    fn info_strings_are_encrypted() {
        let mut doc = sample_document();
        protect(&mut doc, &full_protection(EncryptionLevel::Aes256)).unwrap();

        let info_id = match doc.inner().trailer.get(b"Info").unwrap() {
            Object::Reference(id) => *id,
            other => panic!("unexpected /Info: {other:?}"),
        };
        match doc.inner().get_object(info_id) {
            Ok(Object::Dictionary(info)) => match info.get(b"Title").unwrap() {
                Object::String(data, _) => assert_ne!(data.as_slice(), b"Quarterly report"),
                other => panic!("unexpected /Title: {other:?}"),
            },
            other => panic!("info is not a dictionary: {other:?}"),
        }
    }
}
