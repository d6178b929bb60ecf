use std::collections::HashMap;

use async_trait::async_trait;

use relief_types::Location;

/// Errors reported by external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result of an identity verification attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub message: String,
    pub name: Option<String>,
}

impl VerificationOutcome {
    pub fn verified(name: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Identity verified".into(),
            name: Some(name.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            name: None,
        }
    }
}

/// Resolves a postal PIN code to a delivery location.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// `Ok(None)` means the service answered but does not know the code.
    async fn lookup(&self, pin_code: &str) -> Result<Option<Location>, CollaboratorError>;
}

/// Checks an identity credential.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<VerificationOutcome, CollaboratorError>;
}

/// Offline stand-in for an identity service.
///
/// Accepts any 12-digit numeric credential (spaces ignored) and, when
/// `require_checksum` is set, only those whose last digit is a valid
/// Verhoeff check digit.
#[derive(Clone, Debug, Default)]
pub struct SimulatedIdentityVerifier {
    pub require_checksum: bool,
}

impl SimulatedIdentityVerifier {
    pub const VERIFIED_NAME: &'static str = "Verified User";

    pub fn new(require_checksum: bool) -> Self {
        Self { require_checksum }
    }
}

#[async_trait]
impl IdentityVerifier for SimulatedIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<VerificationOutcome, CollaboratorError> {
        let digits = normalize_credential(credential);
        if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(VerificationOutcome::rejected(
                "credential must be exactly 12 digits",
            ));
        }
        if self.require_checksum && !verhoeff_valid(&digits) {
            return Ok(VerificationOutcome::rejected("credential checksum is invalid"));
        }
        Ok(VerificationOutcome::verified(Self::VERIFIED_NAME))
    }
}

/// Strip whitespace from a credential as typed by a user.
pub fn normalize_credential(credential: &str) -> String {
    credential.chars().filter(|c| !c.is_whitespace()).collect()
}

const VERHOEFF_D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const VERHOEFF_P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const VERHOEFF_INV: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

/// Returns `true` if `digits` ends in a valid Verhoeff check digit.
pub fn verhoeff_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let c = digits
        .bytes()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, b)| {
            VERHOEFF_D[c as usize][VERHOEFF_P[i % 8][(b - b'0') as usize] as usize]
        });
    c == 0
}

/// Check digit to append to `digits`. `None` if `digits` is not numeric.
pub fn verhoeff_check_digit(digits: &str) -> Option<char> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let c = digits
        .bytes()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, b)| {
            VERHOEFF_D[c as usize][VERHOEFF_P[(i + 1) % 8][(b - b'0') as usize] as usize]
        });
    Some(char::from(b'0' + VERHOEFF_INV[c as usize]))
}

/// In-memory PIN code table.
#[derive(Clone, Debug, Default)]
pub struct StaticLocationLookup {
    entries: HashMap<String, Location>,
}

impl StaticLocationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: Location) {
        self.entries.insert(location.pin_code.clone(), location);
    }

    pub fn with(mut self, location: Location) -> Self {
        self.insert(location);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LocationLookup for StaticLocationLookup {
    async fn lookup(&self, pin_code: &str) -> Result<Option<Location>, CollaboratorError> {
        Ok(self.entries.get(pin_code.trim()).cloned())
    }
}
