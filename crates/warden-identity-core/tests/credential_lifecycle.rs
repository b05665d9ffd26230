//! End-to-end checks of enrollment, password changes and fingerprints.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use warden_crypto::salted_password;
use warden_identity_core::{
    integrity, ErrorKind, IdentityCore, IdentityCoreError, IdentityCoreService, IntegrityAuditor,
    IntegrityViolation, LookupField, StoredTenantPolicies, User, UserField,
};
use warden_policy::{CredentialPolicy, PasswordPolicyEngine, TenantPolicy};
use warden_storage::{MemoryStorage, Storage, CF_USERS};

#[derive(Default)]
struct CollectingAuditor(Mutex<Vec<IntegrityViolation>>);

#[async_trait]
impl IntegrityAuditor for CollectingAuditor {
    async fn report(&self, violation: IntegrityViolation) {
        self.0.lock().unwrap().push(violation);
    }
}

type Service = IdentityCoreService<
    PasswordPolicyEngine,
    StoredTenantPolicies<MemoryStorage>,
    CollectingAuditor,
    MemoryStorage,
>;

struct Harness {
    service: Service,
    storage: Arc<MemoryStorage>,
    auditor: Arc<CollectingAuditor>,
}

impl Harness {
    async fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let tenants = StoredTenantPolicies::new(storage.clone());
        tenants
            .put_policy(&TenantPolicy::salted("T", "xyz"))
            .await
            .unwrap();
        tenants.put_policy(&TenantPolicy::plain("U")).await.unwrap();

        let auditor = Arc::new(CollectingAuditor::default());
        let service = IdentityCoreService::new(
            Arc::new(PasswordPolicyEngine::new()),
            Arc::new(tenants),
            auditor.clone(),
            storage.clone(),
        );
        Self {
            service,
            storage,
            auditor,
        }
    }

    async fn raw(&self, owner: &str, name: &str) -> User {
        self.storage
            .get(CF_USERS, &(owner, name))
            .await
            .unwrap()
            .unwrap()
    }

    async fn enroll(&self, owner: &str, name: &str, password: &str) {
        let user = User {
            owner: owner.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            display_name: name.to_string(),
            ..Default::default()
        };
        assert!(self.service.create_user(user).await.unwrap());
    }
}

#[tokio::test]
async fn fingerprints_hold_across_every_mutation() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "old1!x").await;

    let created = h.raw("T", "alice").await;
    assert!(integrity::is_consistent(&created));
    assert_eq!(created.current_fingerprint, created.origin_fingerprint);

    let mutations = vec![
        UserField::DisplayName("Alice".into()),
        UserField::Avatar("https://cdn.example/a.png".into()),
        UserField::Phone("+15550100".into()),
        UserField::Email("alice@t.io".into()),
        UserField::Password("second2".into()),
        UserField::IsAdmin(true),
    ];
    for field in mutations {
        assert!(h.service.set_user_field("T", "alice", field).await.unwrap());
        let stored = h.raw("T", "alice").await;
        assert!(integrity::is_consistent(&stored));
        assert_eq!(stored.origin_fingerprint, created.origin_fingerprint);
    }

    h.service
        .change_password(Some("T/alice"), "T", "alice", "second2", "third33")
        .await
        .unwrap();
    let stored = h.raw("T", "alice").await;
    assert!(integrity::is_consistent(&stored));
    assert_eq!(stored.origin_fingerprint, created.origin_fingerprint);
    assert!(h.auditor.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn salted_password_change_end_to_end() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "old1!").await;
    let before = h.raw("T", "alice").await;
    assert_eq!(before.password, salted_password("old1!", "xyz"));

    h.service
        .change_password(Some("T/alice"), "T", "alice", "old1!", "new1!")
        .await
        .unwrap();

    let after = h.raw("T", "alice").await;
    assert_eq!(after.password, salted_password("new1!", "xyz"));
    assert_ne!(after.current_fingerprint, before.current_fingerprint);
    assert_eq!(after.origin_fingerprint, before.origin_fingerprint);
}

#[tokio::test]
async fn rejected_new_passwords_do_not_mutate() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "old1!x").await;
    let before = h.raw("T", "alice").await;

    for bad in ["ab cde", "abcde"] {
        let err = h
            .service
            .change_password(Some("T/alice"), "T", "alice", "old1!x", bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.raw("T", "alice").await, before);
    }
}

#[tokio::test]
async fn authorization_boundary() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "alice11").await;
    h.enroll("T", "bob", "bob1111").await;
    h.enroll("T", "carol", "carol11").await;
    h.enroll("T", "eve", "eve1111").await;
    h.enroll("T", "frank", "frank11").await;
    h.enroll("U", "dave", "dave111").await;
    h.enroll("U", "root", "root111").await;
    h.service
        .set_user_field("T", "bob", UserField::IsAdmin(true))
        .await
        .unwrap();
    h.service
        .set_user_field("U", "root", UserField::IsGlobalAdmin(true))
        .await
        .unwrap();

    let attempt = |requester: &'static str, owner: &'static str, name: &'static str, old: &'static str| {
        let service = &h.service;
        async move {
            service
                .change_password(Some(requester), owner, name, old, "changed1")
                .await
        }
    };

    assert!(attempt("U/root", "T", "carol", "carol11").await.is_ok());
    assert!(attempt("T/alice", "T", "alice", "alice11").await.is_ok());
    assert!(attempt("T/bob", "T", "carol", "changed1").await.is_ok());

    let denied = attempt("T/bob", "U", "dave", "dave111").await.unwrap_err();
    assert!(matches!(denied, IdentityCoreError::PermissionDenied));
    let denied = attempt("T/eve", "T", "frank", "frank11").await.unwrap_err();
    assert!(matches!(denied, IdentityCoreError::PermissionDenied));
}

#[tokio::test]
async fn unsupported_mode_is_a_policy_error() {
    let engine = PasswordPolicyEngine::new();
    let policy = TenantPolicy {
        password_type: "bcrypt-legacy".to_string(),
        ..TenantPolicy::plain("L")
    };

    let transform: IdentityCoreError = engine
        .transform_for_storage("secret1", &policy)
        .unwrap_err()
        .into();
    let verify: IdentityCoreError = engine
        .verify("secret1", "secret1", &policy)
        .unwrap_err()
        .into();
    assert_eq!(transform.kind(), ErrorKind::Policy);
    assert_eq!(verify.kind(), ErrorKind::Policy);
}

#[tokio::test]
async fn lookup_prefers_name_over_email() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "alice11").await;
    h.enroll("T", "bob", "bob1111").await;
    h.service
        .set_user_field("T", "bob", UserField::Email("alice@x.com".into()))
        .await
        .unwrap();
    h.service
        .set_user_field("T", "alice", UserField::Email("real@x.com".into()))
        .await
        .unwrap();

    let by_name = h.service.resolve_user("T", "alice").await.unwrap().unwrap();
    assert_eq!(by_name.name, "alice");
    let by_email = h.service.resolve_user("T", "alice@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.name, "bob");
    assert!(h
        .service
        .has_user_by_field("T", LookupField::Email, "real@x.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn returned_records_are_masked() {
    let h = Harness::new().await;
    h.enroll("T", "alice", "alice11").await;

    for user in h.service.list_global_users().await.unwrap() {
        assert_eq!(user.password, "***");
        assert_eq!(warden_identity_core::mask_user(user.clone()), user);
    }
    let user = h.service.get_user("T/alice").await.unwrap().unwrap();
    assert_eq!(user.password, "***");
    assert_ne!(h.raw("T", "alice").await.password, "***");
}
