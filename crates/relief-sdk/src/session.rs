use relief_types::{credential_digest, BeneficiaryId, Digest};

/// Identity established by a successful verification.
///
/// Only the credential digest is kept; the raw credential never leaves
/// [`Session::start_verification`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub beneficiary_id: BeneficiaryId,
    pub name: String,
    pub credential_digest: Digest,
}

/// Verification session state machine.
///
/// `Unauthenticated -> Verifying -> Verified -> Unauthenticated`. A failed or
/// erroring verification returns to `Unauthenticated`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Verifying {
        beneficiary_id: BeneficiaryId,
        credential_digest: Digest,
    },
    Verified(VerifiedIdentity),
}

impl Session {
    /// Enter `Verifying` for `credential`, replacing any current state.
    pub fn start_verification(&mut self, credential: &str) -> BeneficiaryId {
        let beneficiary_id = BeneficiaryId::derive(credential);
        *self = Self::Verifying {
            beneficiary_id: beneficiary_id.clone(),
            credential_digest: credential_digest(credential),
        };
        beneficiary_id
    }

    /// Move from `Verifying` to `Verified`.
    ///
    /// Returns `None` (and leaves the state alone) unless the session is
    /// verifying `beneficiary_id`, e.g. after a concurrent logout.
    pub fn complete(
        &mut self,
        beneficiary_id: &BeneficiaryId,
        name: impl Into<String>,
    ) -> Option<VerifiedIdentity> {
        let Self::Verifying {
            beneficiary_id: pending,
            credential_digest,
        } = self
        else {
            return None;
        };
        if *pending != *beneficiary_id {
            return None;
        }
        let identity = VerifiedIdentity {
            beneficiary_id: pending.clone(),
            name: name.into(),
            credential_digest: *credential_digest,
        };
        *self = Self::Verified(identity.clone());
        Some(identity)
    }

    /// Return to `Unauthenticated`.
    pub fn reset(&mut self) {
        *self = Self::Unauthenticated;
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        match self {
            Self::Verified(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.identity().is_some()
    }

    /// Returns `true` if the session is verified as `beneficiary_id`.
    pub fn authorizes(&self, beneficiary_id: &BeneficiaryId) -> bool {
        self.identity()
            .is_some_and(|identity| &identity.beneficiary_id == beneficiary_id)
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Verifying { .. } => "verifying",
            Self::Verified(_) => "verified",
        }
    }
}
