// SPDX-License-Identifier: MIT
//
// Core domain types for the Quire PDF editing engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page rotation in 90-degree steps.
///
/// Rotation is stored normalized into [0, 360) and accumulates: applying a
/// delta to an existing value is always `(existing + delta) mod 360`, never
/// an absolute overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationAngle {
    R0,
    R90,
    R180,
    R270,
}

impl RotationAngle {
    /// Parse a caller-supplied angle in degrees.
    ///
    /// Accepts any multiple of 90, including negatives (`-90` becomes 270).
    pub fn try_from_degrees(degrees: i32) -> Result<Self, EngineError> {
        if degrees % 90 != 0 {
            return Err(EngineError::InvalidAngle(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Self::R0,
            90 => Self::R90,
            180 => Self::R180,
            270 => Self::R270,
            _ => unreachable!("rem_euclid(360) of a multiple of 90"),
        })
    }

    /// The angle in degrees, in [0, 360).
    pub fn degrees(&self) -> i32 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Accumulate this delta onto an existing stored rotation.
    pub fn apply_to(&self, existing_degrees: i32) -> i32 {
        (existing_degrees + self.degrees()).rem_euclid(360)
    }
}

/// One entry of an Organize pass: take `original_page` from the source,
/// place it next in the target, and add `rotation` to its stored rotation.
///
/// The list a caller supplies is already ordered by target position; the
/// engine appends in list order and does not re-sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOperation {
    /// 1-based page number in the source document.
    pub original_page: u32,
    /// 1-based position in the target document (informational; list order
    /// is what the engine follows).
    pub new_position: u32,
    /// Additive rotation delta for the copied page.
    pub rotation: RotationAngle,
}

/// Encryption strength for document protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionLevel {
    /// No encryption; protection becomes a no-op.
    None,
    /// RC4 with a 128-bit key (V2/R3). Legacy, weakest supported option.
    Rc4_128,
    /// AES-128 in CBC mode (V4/R4).
    Aes128,
    /// AES-256 per PDF 2.0 (V5/R6).
    Aes256,
}

/// What a compliant reader should allow for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintPermission {
    Denied,
    LowRes,
    HighRes,
}

/// Operations a compliant reader should permit on the protected document.
///
/// Each flag maps to one bit of the PDF permission bitmask; everything
/// defaults to denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub printing: PrintPermission,
    pub modifying: bool,
    pub copying: bool,
    pub annotating: bool,
    pub filling_forms: bool,
    pub content_accessibility: bool,
    pub document_assembly: bool,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self {
            printing: PrintPermission::Denied,
            modifying: false,
            copying: false,
            annotating: false,
            filling_forms: false,
            content_accessibility: false,
            document_assembly: false,
        }
    }
}

/// How the protection is meant to behave in a compliant reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionMode {
    /// The document cannot be opened without the user password.
    FullProtection,
    /// Readers open the document without prompting but refuse restricted
    /// operations. This restrains compliant readers only; it is policy
    /// enforcement, not confidentiality.
    PermissionsOnly,
}

/// Complete protection request for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionSettings {
    pub level: EncryptionLevel,
    pub mode: ProtectionMode,
    /// Password needed to open the document. Empty means "open without
    /// prompt" and is only valid in [`ProtectionMode::PermissionsOnly`].
    pub user_password: String,
    /// Password that unlocks restricted operations. Defaults to the user
    /// password when unset.
    pub owner_password: Option<String>,
    pub permissions: PermissionSet,
}

impl ProtectionSettings {
    /// The owner password that will actually be written: the explicit one,
    /// or the user password as fallback.
    pub fn effective_owner_password(&self) -> &str {
        match &self.owner_password {
            Some(p) if !p.is_empty() => p,
            _ => &self.user_password,
        }
    }
}

/// Coarse pipeline checkpoints used for progress reporting and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Load,
    Transform,
    Save,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Load => "loading document",
            Self::Transform => "applying changes",
            Self::Save => "saving document",
        }
    }
}

/// Summary record returned alongside the output bytes of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Page count of the output document.
    pub page_count: u32,
    pub original_size_bytes: u64,
    pub output_size_bytes: u64,
    pub processing_time_ms: u64,
}

/// A completed pipeline run: output bytes plus bookkeeping.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub run_id: RunId,
    pub bytes: Vec<u8>,
    pub metadata: OutputMetadata,
    pub completed_at: DateTime<Utc>,
}
