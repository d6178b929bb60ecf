use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use relief_ledger::{
    Block, Chain, IdentityChain, IntegrityStatus, LedgerError, RecordVerification,
    IDENTITY_CHAIN_PREFIX,
};
use relief_store::{FileStore, InMemoryStore, KeyValueStore};
use relief_types::{
    is_valid_pin_code, BeneficiaryId, ClaimRecord, DisbursementRecord, Location, Origin, Payload,
    ReliefCategory, ReliefId, Timestamp,
};

use crate::collaborators::{
    normalize_credential, IdentityVerifier, LocationLookup, SimulatedIdentityVerifier,
    StaticLocationLookup,
};
use crate::config::LedgerConfig;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::session::{Session, VerifiedIdentity};

/// Storage key of the last relief-id sequence number handed out.
pub const SEQUENCE_KEY: &str = "relief_sequence";

/// Officer-entered disbursement details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisbursementDetails {
    pub location: Location,
    pub category: ReliefCategory,
    pub quantity: String,
    pub notes: String,
}

/// Beneficiary-entered claim details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimDetails {
    pub location: Location,
    pub receipt_date: Option<String>,
}

/// What a reconciliation pass repaired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Claims copied into the global ledger.
    pub replicated: Vec<ReliefId>,
    /// Storage keys of chains that were written again.
    pub repersisted: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.replicated.is_empty() && self.repersisted.is_empty()
    }

    fn merge(&mut self, other: ReconcileReport) {
        self.replicated.extend(other.replicated);
        for key in other.repersisted {
            if !self.repersisted.contains(&key) {
                self.repersisted.push(key);
            }
        }
    }
}

/// Coordinates the global ledger, identity-scoped ledgers, and the
/// verification session.
pub struct LedgerCoordinator {
    config: LedgerConfig,
    store: Arc<dyn KeyValueStore>,
    global: Chain,
    identities: Mutex<HashMap<BeneficiaryId, Arc<IdentityChain>>>,
    /// Serializes relief-id allocation.
    sequence: Mutex<()>,
    session: Mutex<Session>,
    verifier: Arc<dyn IdentityVerifier>,
    locations: Arc<dyn LocationLookup>,
}

impl LedgerCoordinator {
    /// Build a coordinator over `store`, loading or creating the global
    /// ledger.
    pub fn new(
        config: LedgerConfig,
        store: Arc<dyn KeyValueStore>,
        verifier: Arc<dyn IdentityVerifier>,
        locations: Arc<dyn LocationLookup>,
    ) -> CoordinatorResult<Self> {
        config.validate()?;
        let global = Chain::initialize_global(store.clone())?;
        debug!(key = global.key(), "coordinator ready");
        Ok(Self {
            config,
            store,
            global,
            identities: Mutex::new(HashMap::new()),
            sequence: Mutex::new(()),
            session: Mutex::new(Session::default()),
            verifier,
            locations,
        })
    }

    /// File-backed coordinator rooted at `config.data_dir`, using the
    /// simulated identity verifier and the configured PIN directory.
    pub fn open(config: LedgerConfig) -> CoordinatorResult<Self> {
        let store = FileStore::open(&config.data_dir)?;
        Self::with_simulated_collaborators(config, Arc::new(store))
    }

    /// In-memory coordinator honouring `config.storage_quota_bytes`.
    pub fn in_memory(config: LedgerConfig) -> CoordinatorResult<Self> {
        let store = match config.storage_quota_bytes {
            Some(limit) => InMemoryStore::with_quota(limit),
            None => InMemoryStore::new(),
        };
        Self::with_simulated_collaborators(config, Arc::new(store))
    }

    fn with_simulated_collaborators(
        config: LedgerConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> CoordinatorResult<Self> {
        let verifier = SimulatedIdentityVerifier::new(config.require_checksum);
        let mut locations = StaticLocationLookup::new();
        for location in &config.locations {
            locations.insert(location.clone());
        }
        Self::new(config, store, Arc::new(verifier), Arc::new(locations))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The global relief ledger.
    pub fn global(&self) -> &Chain {
        &self.global
    }

    /// Identity-scoped ledger of `beneficiary_id`, created on first use.
    pub fn identity_chain(
        &self,
        beneficiary_id: &BeneficiaryId,
    ) -> CoordinatorResult<Arc<IdentityChain>> {
        let mut identities = self
            .identities
            .lock()
            .map_err(|_| LedgerError::LockPoisoned)?;
        if let Some(chain) = identities.get(beneficiary_id) {
            return Ok(chain.clone());
        }
        let chain = Arc::new(IdentityChain::initialize(
            self.store.clone(),
            beneficiary_id.clone(),
        )?);
        identities.insert(beneficiary_id.clone(), chain.clone());
        Ok(chain)
    }

    /// Existing identity-scoped ledger of `beneficiary_id`.
    ///
    /// Never creates one; a beneficiary without a stored ledger is
    /// [`CoordinatorError::BeneficiaryNotFound`].
    pub fn find_identity_chain(
        &self,
        beneficiary_id: &BeneficiaryId,
    ) -> CoordinatorResult<Arc<IdentityChain>> {
        let mut identities = self
            .identities
            .lock()
            .map_err(|_| LedgerError::LockPoisoned)?;
        if let Some(chain) = identities.get(beneficiary_id) {
            return Ok(chain.clone());
        }
        let chain = IdentityChain::open(self.store.clone(), beneficiary_id.clone())?
            .map(Arc::new)
            .ok_or_else(|| CoordinatorError::BeneficiaryNotFound(beneficiary_id.clone()))?;
        identities.insert(beneficiary_id.clone(), chain.clone());
        Ok(chain)
    }

    /// Allocate the next relief id.
    ///
    /// The last sequence number is persisted under [`SEQUENCE_KEY`] before
    /// the id is returned, so ids held only by an identity chain (a claim
    /// whose global copy is still pending) are never handed out again.
    fn next_relief_id(&self) -> CoordinatorResult<ReliefId> {
        let _guard = self.sequence.lock().map_err(|_| LedgerError::LockPoisoned)?;
        let last = match self.store.get(SEQUENCE_KEY)? {
            Some(text) => text
                .trim()
                .parse::<u64>()
                .map_err(|_| CoordinatorError::CorruptSequence { value: text })?,
            None => 0,
        };

        let date = Timestamp::now().date_stamp()?;
        let mut sequence = (last + 1).max(self.global.len()? as u64);
        let mut relief_id = ReliefId::generate(&self.config.relief_id_prefix, &date, sequence);
        while self
            .global
            .find_by_record_id(relief_id.as_str())?
            .is_some()
        {
            sequence += 1;
            relief_id = ReliefId::generate(&self.config.relief_id_prefix, &date, sequence);
        }

        self.store.set(SEQUENCE_KEY, &sequence.to_string())?;
        debug!(sequence, relief_id = %relief_id, "allocated relief id");
        Ok(relief_id)
    }

    // ---- Recording ----

    /// Record an officer disbursement on the global ledger.
    pub fn record_disbursement(&self, details: DisbursementDetails) -> CoordinatorResult<Block> {
        let relief_id = self.next_relief_id()?;
        let record = DisbursementRecord::officer(
            relief_id,
            details.location,
            details.category,
            details.quantity,
            details.notes,
        );
        let block = self.global.append(Payload::Disbursement(record))?;
        info!(
            seq = block.sequence_index,
            relief_id = %block.relief_id(),
            category = %block.payload.category(),
            "disbursement recorded"
        );
        Ok(block)
    }

    /// Record a beneficiary's own claim and replicate it to the global
    /// ledger.
    ///
    /// Returns the identity-chain block. If the global append fails the claim
    /// still stands and [`CoordinatorError::ReplicationPending`] is returned;
    /// [`LedgerCoordinator::reconcile`] completes the replication.
    pub fn submit_claim(
        &self,
        beneficiary_id: &BeneficiaryId,
        category: ReliefCategory,
        details: ClaimDetails,
    ) -> CoordinatorResult<Block> {
        if !self.session()?.authorizes(beneficiary_id) {
            return Err(CoordinatorError::Unauthenticated);
        }

        let identity = self.identity_chain(beneficiary_id)?;
        if identity.has_category(&category)? {
            warn!(beneficiary = %beneficiary_id, category = %category, "duplicate claim rejected");
            return Err(CoordinatorError::DuplicateClaim { category });
        }

        let claim = ClaimRecord {
            relief_id: self.next_relief_id()?,
            beneficiary_id: beneficiary_id.clone(),
            location: details.location,
            category,
            receipt_date: details.receipt_date,
        };
        let replica = DisbursementRecord::replicated_from(&claim);

        let block = identity.append_claim(claim).map_err(|err| match err {
            LedgerError::DuplicateCategory { category } => {
                CoordinatorError::DuplicateClaim { category }
            }
            other => CoordinatorError::Ledger(other),
        })?;

        if let Err(source) = self.global.append(Payload::Disbursement(replica)) {
            warn!(
                beneficiary = %beneficiary_id,
                relief_id = %block.relief_id(),
                error = %source,
                "claim replication to global ledger failed"
            );
            return Err(CoordinatorError::ReplicationPending {
                claim: Box::new(block),
                source: Box::new(source),
            });
        }
        Ok(block)
    }

    // ---- Reconciliation ----

    /// Replay the claims of `beneficiary_id` into the global ledger and
    /// re-persist any non-durable chain involved. Idempotent.
    pub fn reconcile(&self, beneficiary_id: &BeneficiaryId) -> CoordinatorResult<ReconcileReport> {
        let identity = self.find_identity_chain(beneficiary_id)?;
        let mut report = ReconcileReport::default();

        if !identity.chain().is_durable()? {
            identity.chain().persist()?;
            report.repersisted.push(identity.chain().key().to_string());
        }

        for claim in identity.claims()? {
            if self
                .global
                .find_where(|b| is_replica_of(b, &claim))?
                .is_some()
            {
                continue;
            }
            let replica = DisbursementRecord::replicated_from(&claim);
            match self.global.append(Payload::Disbursement(replica)) {
                Ok(_) | Err(LedgerError::NotDurable { .. }) => {}
                Err(other) => return Err(other.into()),
            }
            warn!(
                beneficiary = %beneficiary_id,
                relief_id = %claim.relief_id,
                "replicated missing claim into global ledger"
            );
            report.replicated.push(claim.relief_id);
        }

        if !self.global.is_durable()? {
            self.global.persist()?;
            report.repersisted.push(self.global.key().to_string());
        }
        Ok(report)
    }

    /// Reconcile every identity chain in the store or in memory.
    pub fn reconcile_all(&self) -> CoordinatorResult<ReconcileReport> {
        let mut beneficiaries: Vec<BeneficiaryId> = self
            .store
            .keys(IDENTITY_CHAIN_PREFIX)?
            .iter()
            .filter_map(|key| key.strip_prefix(IDENTITY_CHAIN_PREFIX))
            .filter_map(|id| BeneficiaryId::parse(id).ok())
            .collect();
        {
            let identities = self
                .identities
                .lock()
                .map_err(|_| LedgerError::LockPoisoned)?;
            for id in identities.keys() {
                if !beneficiaries.contains(id) {
                    beneficiaries.push(id.clone());
                }
            }
        }
        beneficiaries.sort();

        let mut report = ReconcileReport::default();
        for id in &beneficiaries {
            report.merge(self.reconcile(id)?);
        }
        if !self.global.is_durable()? {
            self.global.persist()?;
            report.merge(ReconcileReport {
                replicated: Vec::new(),
                repersisted: vec![self.global.key().to_string()],
            });
        }
        Ok(report)
    }

    // ---- Session ----

    /// Current session state.
    pub fn session(&self) -> CoordinatorResult<Session> {
        let session = self.session.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(session.clone())
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> CoordinatorResult<T> {
        let mut session = self.session.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(f(&mut session))
    }

    /// Verify `credential` and, on success, open a verified session and the
    /// beneficiary's identity chain.
    pub async fn begin_session(&self, credential: &str) -> CoordinatorResult<VerifiedIdentity> {
        let credential = normalize_credential(credential);
        let beneficiary_id = self.with_session(|s| s.start_verification(&credential))?;
        info!(beneficiary = %beneficiary_id, "verifying identity");

        let outcome = match self.verifier.verify(&credential).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.with_session(Session::reset)?;
                warn!(beneficiary = %beneficiary_id, error = %err, "identity service failed");
                return Err(err.into());
            }
        };
        if !outcome.success {
            self.with_session(Session::reset)?;
            info!(beneficiary = %beneficiary_id, reason = %outcome.message, "identity rejected");
            return Err(CoordinatorError::VerificationFailed(outcome.message));
        }

        let name = outcome
            .name
            .unwrap_or_else(|| SimulatedIdentityVerifier::VERIFIED_NAME.to_string());
        let identity = self
            .with_session(|s| s.complete(&beneficiary_id, name))?
            .ok_or(CoordinatorError::Unauthenticated)?;
        self.identity_chain(&beneficiary_id)?;
        info!(beneficiary = %beneficiary_id, "session verified");
        Ok(identity)
    }

    /// End the session.
    pub fn logout(&self) -> CoordinatorResult<()> {
        self.with_session(Session::reset)?;
        info!("session closed");
        Ok(())
    }

    // ---- Lookup & integrity ----

    /// Resolve a PIN code. Malformed codes resolve to `None` without asking
    /// the lookup service.
    pub async fn resolve_location(&self, pin_code: &str) -> CoordinatorResult<Option<Location>> {
        let pin_code = pin_code.trim();
        if !is_valid_pin_code(pin_code) {
            return Ok(None);
        }
        Ok(self.locations.lookup(pin_code).await?)
    }

    /// Locate a record on the global ledger and recompute its digest.
    pub fn verify_record(&self, relief_id: &str) -> CoordinatorResult<RecordVerification> {
        Ok(self.global.verify_record(relief_id.trim())?)
    }

    /// Global-ledger block carrying `relief_id`.
    pub fn record(&self, relief_id: &str) -> CoordinatorResult<Block> {
        let relief_id = relief_id.trim();
        self.global
            .find_by_record_id(relief_id)?
            .ok_or_else(|| CoordinatorError::RecordNotFound(relief_id.to_string()))
    }

    pub fn global_integrity(&self) -> IntegrityStatus {
        self.global.integrity()
    }

    pub fn beneficiary_integrity(
        &self,
        beneficiary_id: &BeneficiaryId,
    ) -> CoordinatorResult<IntegrityStatus> {
        Ok(self.find_identity_chain(beneficiary_id)?.chain().integrity())
    }
}

/// Returns `true` if `block` is the global-ledger copy of `claim`.
fn is_replica_of(block: &Block, claim: &ClaimRecord) -> bool {
    match &block.payload {
        Payload::Disbursement(d) => {
            d.origin == Origin::Beneficiary
                && d.relief_id == claim.relief_id
                && d.category == claim.category
                && d.location == claim.location
        }
        _ => false,
    }
}

impl std::fmt::Debug for LedgerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerCoordinator")
            .field("config", &self.config)
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use relief_ledger::GLOBAL_CHAIN_KEY;
    use relief_store::{StoreError, StoreResult};

    use super::*;
    use crate::collaborators::{CollaboratorError, VerificationOutcome};

    const CREDENTIAL: &str = "123456789012";

    /// Store whose writes to one key can be switched off.
    struct FlakyStore {
        inner: InMemoryStore,
        failing_key: &'static str,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn new(failing_key: &'static str) -> Self {
            Self {
                inner: InMemoryStore::new(),
                failing_key,
                failing: AtomicBool::new(false),
            }
        }

        fn fail(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if key == self.failing_key && self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::ReadOnly);
            }
            self.inner.set(key, value)
        }
        fn delete(&self, key: &str) -> StoreResult<bool> {
            self.inner.delete(key)
        }
        fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
            self.inner.keys(prefix)
        }
    }

    struct DownVerifier;

    #[async_trait]
    impl IdentityVerifier for DownVerifier {
        async fn verify(
            &self,
            _credential: &str,
        ) -> Result<VerificationOutcome, CollaboratorError> {
            Err(CollaboratorError::Unavailable("identity service offline".into()))
        }
    }

    struct DownLookup;

    #[async_trait]
    impl LocationLookup for DownLookup {
        async fn lookup(&self, _pin_code: &str) -> Result<Option<Location>, CollaboratorError> {
            Err(CollaboratorError::Unavailable("postal service offline".into()))
        }
    }

    fn nadia() -> Location {
        Location::new("Nadia", "West Bengal", "Krishnanagar", "", "741101").unwrap()
    }

    fn lookup() -> StaticLocationLookup {
        StaticLocationLookup::new().with(nadia())
    }

    fn config() -> LedgerConfig {
        LedgerConfig {
            locations: vec![nadia()],
            ..LedgerConfig::default()
        }
    }

    fn coordinator_over(store: Arc<dyn KeyValueStore>) -> LedgerCoordinator {
        LedgerCoordinator::new(
            LedgerConfig::default(),
            store,
            Arc::new(SimulatedIdentityVerifier::default()),
            Arc::new(lookup()),
        )
        .unwrap()
    }

    fn details() -> ClaimDetails {
        ClaimDetails {
            location: nadia(),
            receipt_date: Some("2026-02-03".into()),
        }
    }

    fn category(name: &str) -> ReliefCategory {
        ReliefCategory::new(name).unwrap()
    }

    #[test]
    fn record_disbursement_generates_sequential_ids() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        let first = coordinator
            .record_disbursement(DisbursementDetails {
                location: nadia(),
                category: category("food"),
                quantity: "10 kg".into(),
                notes: String::new(),
            })
            .unwrap();
        let second = coordinator
            .record_disbursement(DisbursementDetails {
                location: nadia(),
                category: category("water"),
                quantity: String::new(),
                notes: String::new(),
            })
            .unwrap();

        let id = first.relief_id().as_str();
        assert!(id.starts_with("RP-WB-"));
        assert!(id.ends_with("-001"));
        assert!(second.relief_id().as_str().ends_with("-002"));
        assert!(coordinator.global().validate());
        assert_eq!(coordinator.record(id).unwrap().digest, first.digest);
    }

    #[test]
    fn unknown_record_is_not_found() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        assert!(matches!(
            coordinator.record("RP-WB-20260201-404"),
            Err(CoordinatorError::RecordNotFound(_))
        ));
        assert_eq!(
            coordinator.verify_record("RP-WB-20260201-404").unwrap(),
            RecordVerification::NotFound
        );
    }

    #[test]
    fn claim_requires_verified_session() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        let id = BeneficiaryId::derive(CREDENTIAL);
        assert!(matches!(
            coordinator.submit_claim(&id, category("FOOD"), details()),
            Err(CoordinatorError::Unauthenticated)
        ));
        assert_eq!(coordinator.global().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        let identity = coordinator.begin_session("1234 5678 9012").await.unwrap();
        assert_eq!(identity.beneficiary_id, BeneficiaryId::derive(CREDENTIAL));
        assert_eq!(identity.name, "Verified User");
        assert!(coordinator.session().unwrap().is_verified());

        coordinator.logout().unwrap();
        assert_eq!(coordinator.session().unwrap(), Session::Unauthenticated);
        assert!(matches!(
            coordinator.submit_claim(&identity.beneficiary_id, category("FOOD"), details()),
            Err(CoordinatorError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn rejected_credential_leaves_session_unauthenticated() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        assert!(matches!(
            coordinator.begin_session("12345").await,
            Err(CoordinatorError::VerificationFailed(_))
        ));
        assert_eq!(coordinator.session().unwrap(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn checksum_config_reaches_verifier() {
        let config = LedgerConfig {
            require_checksum: true,
            ..config()
        };
        let coordinator = LedgerCoordinator::in_memory(config).unwrap();
        let base = "12345678901";
        let check = crate::collaborators::verhoeff_check_digit(base).unwrap();
        let good = format!("{base}{check}");
        let bad_digit = if check == '9' { '0' } else { char::from(check as u8 + 1) };

        assert!(coordinator
            .begin_session(&format!("{base}{bad_digit}"))
            .await
            .is_err());
        assert!(coordinator.begin_session(&good).await.is_ok());
    }

    #[tokio::test]
    async fn verifier_outage_is_collaborator_error() {
        let coordinator = LedgerCoordinator::new(
            LedgerConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(DownVerifier),
            Arc::new(lookup()),
        )
        .unwrap();
        assert!(matches!(
            coordinator.begin_session(CREDENTIAL).await,
            Err(CoordinatorError::Collaborator(_))
        ));
        assert_eq!(coordinator.session().unwrap(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn claim_is_recorded_on_both_chains() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        let identity = coordinator.begin_session(CREDENTIAL).await.unwrap();
        let id = identity.beneficiary_id;

        let block = coordinator
            .submit_claim(&id, category("FOOD"), details())
            .unwrap();
        assert!(matches!(block.payload, Payload::Claim(_)));

        let replica = coordinator.record(block.relief_id().as_str()).unwrap();
        match &replica.payload {
            Payload::Disbursement(d) => {
                assert_eq!(d.quantity, "Beneficiary Claimed");
                assert_eq!(d.notes, "Citizen-initiated claim");
                assert_eq!(d.origin, relief_types::Origin::Beneficiary);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        assert_eq!(coordinator.global_integrity(), IntegrityStatus::Verified);
        assert_eq!(
            coordinator.beneficiary_integrity(&id).unwrap(),
            IntegrityStatus::Verified
        );
    }

    #[tokio::test]
    async fn duplicate_category_rejected_without_appending() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        let id = coordinator.begin_session(CREDENTIAL).await.unwrap().beneficiary_id;

        coordinator
            .submit_claim(&id, category("FOOD"), details())
            .unwrap();
        let identity_len = coordinator.identity_chain(&id).unwrap().chain().len().unwrap();
        let global_len = coordinator.global().len().unwrap();

        let err = coordinator
            .submit_claim(&id, category("food"), details())
            .unwrap_err();
        match err {
            CoordinatorError::DuplicateClaim { category } => assert_eq!(category.as_str(), "FOOD"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            coordinator.identity_chain(&id).unwrap().chain().len().unwrap(),
            identity_len
        );
        assert_eq!(coordinator.global().len().unwrap(), global_len);

        coordinator
            .submit_claim(&id, category("MEDICINE"), details())
            .unwrap();
        assert_eq!(coordinator.global().len().unwrap(), global_len + 1);
    }

    #[tokio::test]
    async fn failed_replication_is_reported_and_reconciled() {
        let store = Arc::new(FlakyStore::new(GLOBAL_CHAIN_KEY));
        let coordinator = coordinator_over(store.clone());
        let id = coordinator.begin_session(CREDENTIAL).await.unwrap().beneficiary_id;

        store.fail(true);
        let err = coordinator
            .submit_claim(&id, category("SHELTER"), details())
            .unwrap_err();
        let claim = match err {
            CoordinatorError::ReplicationPending { claim, .. } => claim,
            other => panic!("unexpected error: {other}"),
        };
        assert!(coordinator
            .identity_chain(&id)
            .unwrap()
            .has_category(&category("SHELTER"))
            .unwrap());
        assert!(!coordinator.global().is_durable().unwrap());

        store.fail(false);
        let report = coordinator.reconcile_all().unwrap();
        assert!(report.repersisted.contains(&GLOBAL_CHAIN_KEY.to_string()));

        let reloaded = coordinator_over(store.clone());
        assert!(reloaded.record(claim.relief_id().as_str()).is_ok());
        assert!(reloaded.global().validate());

        assert!(coordinator.reconcile_all().unwrap().is_clean());
    }

    #[tokio::test]
    async fn reconcile_replicates_missing_claims() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let id = BeneficiaryId::derive(CREDENTIAL);
        let identity = IdentityChain::initialize(store.clone(), id.clone()).unwrap();
        identity
            .append_claim(ClaimRecord {
                relief_id: ReliefId::generate("RP-WB", "20260201", 7),
                beneficiary_id: id.clone(),
                location: nadia(),
                category: category("FOOD"),
                receipt_date: None,
            })
            .unwrap();

        let coordinator = coordinator_over(store);
        let report = coordinator.reconcile(&id).unwrap();
        assert_eq!(
            report.replicated,
            vec![ReliefId::generate("RP-WB", "20260201", 7)]
        );
        assert!(coordinator.record("RP-WB-20260201-007").is_ok());
        assert!(coordinator.reconcile(&id).unwrap().is_clean());
    }

    #[tokio::test]
    async fn pending_claim_id_is_not_reused_after_restart() {
        let store = Arc::new(FlakyStore::new(GLOBAL_CHAIN_KEY));
        let claim = {
            let coordinator = coordinator_over(store.clone());
            let id = coordinator.begin_session(CREDENTIAL).await.unwrap().beneficiary_id;
            store.fail(true);
            match coordinator.submit_claim(&id, category("FOOD"), details()) {
                Err(CoordinatorError::ReplicationPending { claim, .. }) => claim,
                other => panic!("expected pending replication, got {other:?}"),
            }
        };
        store.fail(false);

        let coordinator = coordinator_over(store.clone());
        let officer = coordinator
            .record_disbursement(DisbursementDetails {
                location: nadia(),
                category: category("WATER"),
                quantity: "20 l".into(),
                notes: String::new(),
            })
            .unwrap();
        assert_ne!(officer.relief_id(), claim.relief_id());

        let report = coordinator.reconcile_all().unwrap();
        assert_eq!(report.replicated, vec![claim.relief_id().clone()]);

        let blocks = coordinator.global().export().unwrap();
        let replicas = blocks
            .iter()
            .filter(|b| {
                matches!(&b.payload, Payload::Disbursement(d) if d.origin == Origin::Beneficiary)
            })
            .count();
        assert_eq!(replicas, 1);
        assert!(coordinator.global().validate());
        assert!(coordinator.reconcile_all().unwrap().is_clean());
    }

    #[test]
    fn officer_record_sharing_an_id_does_not_hide_a_claim() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let id = BeneficiaryId::derive(CREDENTIAL);
        let relief_id = ReliefId::generate("RP-WB", "20260201", 1);
        IdentityChain::initialize(store.clone(), id.clone())
            .unwrap()
            .append_claim(ClaimRecord {
                relief_id: relief_id.clone(),
                beneficiary_id: id.clone(),
                location: nadia(),
                category: category("FOOD"),
                receipt_date: None,
            })
            .unwrap();

        let coordinator = coordinator_over(store);
        coordinator
            .global()
            .append(Payload::Disbursement(DisbursementRecord::officer(
                relief_id.clone(),
                nadia(),
                category("FOOD"),
                "5 kg",
                "",
            )))
            .unwrap();

        assert_eq!(coordinator.reconcile(&id).unwrap().replicated, vec![relief_id]);
        assert!(coordinator.reconcile(&id).unwrap().is_clean());
    }

    #[test]
    fn concurrent_disbursements_get_distinct_ids() {
        let coordinator = Arc::new(LedgerCoordinator::in_memory(config()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let coordinator = coordinator.clone();
                std::thread::spawn(move || {
                    (0..5)
                        .map(|_| {
                            coordinator
                                .record_disbursement(DisbursementDetails {
                                    location: nadia(),
                                    category: category("FOOD"),
                                    quantity: String::new(),
                                    notes: String::new(),
                                })
                                .unwrap()
                                .relief_id()
                                .clone()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<ReliefId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert!(coordinator.global().validate());
    }

    #[test]
    fn corrupt_sequence_is_reported() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        store.set(SEQUENCE_KEY, "twelve").unwrap();
        let coordinator = coordinator_over(store);
        let result = coordinator.record_disbursement(DisbursementDetails {
            location: nadia(),
            category: category("FOOD"),
            quantity: String::new(),
            notes: String::new(),
        });
        assert!(matches!(result, Err(CoordinatorError::CorruptSequence { .. })));
        assert_eq!(coordinator.global().len().unwrap(), 1);
    }

    #[test]
    fn lookups_of_unknown_beneficiary_write_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let coordinator = coordinator_over(store.clone());
        let id = BeneficiaryId::derive("999999999999");

        assert!(matches!(
            coordinator.find_identity_chain(&id),
            Err(CoordinatorError::BeneficiaryNotFound(_))
        ));
        assert!(matches!(
            coordinator.reconcile(&id),
            Err(CoordinatorError::BeneficiaryNotFound(_))
        ));
        assert!(matches!(
            coordinator.beneficiary_integrity(&id),
            Err(CoordinatorError::BeneficiaryNotFound(_))
        ));
        assert!(store.keys(IDENTITY_CHAIN_PREFIX).unwrap().is_empty());
        assert!(coordinator.reconcile_all().unwrap().is_clean());
    }

    #[tokio::test]
    async fn resolve_location() {
        let coordinator = LedgerCoordinator::in_memory(config()).unwrap();
        assert_eq!(
            coordinator.resolve_location("741101").await.unwrap(),
            Some(nadia())
        );
        assert_eq!(coordinator.resolve_location("000000").await.unwrap(), None);
        assert_eq!(coordinator.resolve_location("74110").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lookup_outage_is_collaborator_error() {
        let coordinator = LedgerCoordinator::new(
            LedgerConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(SimulatedIdentityVerifier::default()),
            Arc::new(DownLookup),
        )
        .unwrap();
        assert!(matches!(
            coordinator.resolve_location("741101").await,
            Err(CoordinatorError::Collaborator(_))
        ));
        assert!(matches!(
            coordinator.resolve_location("bad").await,
            Ok(None)
        ));
    }

    #[test]
    fn file_backed_coordinator_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..config()
        };
        let block = {
            let coordinator = LedgerCoordinator::open(config.clone()).unwrap();
            coordinator
                .record_disbursement(DisbursementDetails {
                    location: nadia(),
                    category: category("FOOD"),
                    quantity: "2 kg".into(),
                    notes: "flood relief".into(),
                })
                .unwrap()
        };
        let coordinator = LedgerCoordinator::open(config).unwrap();
        assert_eq!(coordinator.record(block.relief_id().as_str()).unwrap(), block);
        assert!(coordinator.verify_record(block.relief_id().as_str()).unwrap().is_intact());
    }

    #[test]
    fn empty_prefix_config_rejected() {
        let config = LedgerConfig {
            relief_id_prefix: String::new(),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            LedgerCoordinator::in_memory(config),
            Err(CoordinatorError::Config(_))
        ));
    }
}
