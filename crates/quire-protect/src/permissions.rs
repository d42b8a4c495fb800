// SPDX-License-Identifier: MIT
//
// Permission bitmask encoding for the standard security handler's /P entry.

use quire_core::types::{PermissionSet, PrintPermission};

// PDF bit positions are 1-based; bit n carries the value 1 << (n - 1).
const BIT_PRINT: u32 = 1 << 2; // bit 3
const BIT_MODIFY: u32 = 1 << 3; // bit 4
const BIT_COPY: u32 = 1 << 4; // bit 5
const BIT_ANNOTATE: u32 = 1 << 5; // bit 6
const BIT_FILL_FORMS: u32 = 1 << 8; // bit 9
const BIT_ACCESSIBILITY: u32 = 1 << 9; // bit 10
const BIT_ASSEMBLY: u32 = 1 << 10; // bit 11
const BIT_PRINT_HIGH_RES: u32 = 1 << 11; // bit 12

/// Encode a [`PermissionSet`] into the 32-bit /P value.
///
/// All reserved bits must read 1, so the mask starts from all-ones, clears
/// the eight controllable bits, then sets back the ones being granted. The
/// result is reinterpreted as i32 because /P is a signed integer on the
/// wire (a fully permissive mask is -4, not a large positive number).
///
/// High-resolution printing needs both bit 3 and bit 12; bit 12 alone is
/// meaningless and is never set without bit 3.
pub fn encode_permissions(permissions: &PermissionSet) -> i32 {
    let mut mask = !0u32;
    mask &= !(BIT_PRINT
        | BIT_MODIFY
        | BIT_COPY
        | BIT_ANNOTATE
        | BIT_FILL_FORMS
        | BIT_ACCESSIBILITY
        | BIT_ASSEMBLY
        | BIT_PRINT_HIGH_RES);

    match permissions.printing {
        PrintPermission::Denied => {}
        PrintPermission::LowRes => mask |= BIT_PRINT,
        PrintPermission::HighRes => mask |= BIT_PRINT | BIT_PRINT_HIGH_RES,
    }
    if permissions.modifying {
        mask |= BIT_MODIFY;
    }
    if permissions.copying {
        mask |= BIT_COPY;
    }
    if permissions.annotating {
        mask |= BIT_ANNOTATE;
    }
    if permissions.filling_forms {
        mask |= BIT_FILL_FORMS;
    }
    if permissions.content_accessibility {
        mask |= BIT_ACCESSIBILITY;
    }
    if permissions.document_assembly {
        mask |= BIT_ASSEMBLY;
    }

    mask as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_granted() -> PermissionSet {
        PermissionSet {
            printing: PrintPermission::HighRes,
            modifying: true,
            copying: true,
            annotating: true,
            filling_forms: true,
            content_accessibility: true,
            document_assembly: true,
        }
    }

    #[test]
    fn default_denies_all_controllable_bits() {
        let p = encode_permissions(&PermissionSet::default()) as u32;
        assert_eq!(p & BIT_PRINT, 0);
        assert_eq!(p & BIT_MODIFY, 0);
        assert_eq!(p & BIT_COPY, 0);
        assert_eq!(p & BIT_ANNOTATE, 0);
        assert_eq!(p & BIT_FILL_FORMS, 0);
        assert_eq!(p & BIT_ACCESSIBILITY, 0);
        assert_eq!(p & BIT_ASSEMBLY, 0);
        assert_eq!(p & BIT_PRINT_HIGH_RES, 0);
    }

    #[test]
    fn reserved_bits_always_read_one() {
        let reserved = !(BIT_PRINT
            | BIT_MODIFY
            | BIT_COPY
            | BIT_ANNOTATE
            | BIT_FILL_FORMS
            | BIT_ACCESSIBILITY
            | BIT_ASSEMBLY
            | BIT_PRINT_HIGH_RES);
        assert_eq!(encode_permissions(&PermissionSet::default()) as u32 & reserved, reserved);
        assert_eq!(encode_permissions(&all_granted()) as u32 & reserved, reserved);
    }

    #[test]
    fn everything_granted_is_all_ones() {
        // Reserved bits are one and every controllable bit is granted, so
        // the full mask comes out as -1.
        assert_eq!(encode_permissions(&all_granted()), -1i32);
    }

    #[test]
    fn low_res_print_sets_only_bit_three() {
        let permissions = PermissionSet {
            printing: PrintPermission::LowRes,
            ..PermissionSet::default()
        };
        let p = encode_permissions(&permissions) as u32;
        assert_ne!(p & BIT_PRINT, 0);
        assert_eq!(p & BIT_PRINT_HIGH_RES, 0);
    }

    #[test]
    fn high_res_print_sets_both_print_bits() {
        let permissions = PermissionSet {
            printing: PrintPermission::HighRes,
            ..PermissionSet::default()
        };
        let p = encode_permissions(&permissions) as u32;
        assert_ne!(p & BIT_PRINT, 0);
        assert_ne!(p & BIT_PRINT_HIGH_RES, 0);
    }

    #[test]
    fn result_is_negative_as_a_signed_value() {
        // The high reserved bits are set, so /P is always negative.
        assert!(encode_permissions(&PermissionSet::default()) < 0);
    }
}
