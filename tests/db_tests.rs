use warden::auth::jwt::AuthService;
use warden::db::{AuditFilter, Store, SEED_ADMIN_EMAIL, SUPERADMIN_ROLE};

async fn create_test_store() -> Store {
    Store::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

fn test_auth_service() -> AuthService {
    AuthService::new(
        "db-test-secret-key-with-enough-length".to_string(),
        24,
        None,
    )
    .expect("should build auth service")
}

// ============= Users =============

#[tokio::test]
async fn test_user_roundtrip() {
    let store = create_test_store().await;

    let id = store
        .create_user("Ada", "ada@example.com", "$argon2id$fake")
        .await
        .expect("should create user");

    let by_email = store
        .get_user_by_email("ada@example.com")
        .await
        .expect("should query")
        .expect("user exists");
    assert_eq!(by_email.id, id);
    assert_eq!(by_email.name, "Ada");
    assert!(by_email.last_login.is_none());

    let by_id = store
        .get_user_by_id(id)
        .await
        .expect("should query")
        .expect("user exists");
    assert_eq!(by_id.email, "ada@example.com");

    assert!(store
        .get_user_by_email("nobody@example.com")
        .await
        .expect("should query")
        .is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected_by_store() {
    let store = create_test_store().await;

    store
        .create_user("One", "same@example.com", "hash1")
        .await
        .expect("should create user");

    let result = store.create_user("Two", "same@example.com", "hash2").await;
    assert!(result.is_err(), "unique email constraint should hold");
}

#[tokio::test]
async fn test_update_user_and_last_login() {
    let store = create_test_store().await;

    let id = store
        .create_user("Before", "before@example.com", "old-hash")
        .await
        .expect("should create user");

    store
        .update_user(id, "After", "after@example.com", None)
        .await
        .expect("should update");

    let user = store
        .get_user_by_id(id)
        .await
        .expect("should query")
        .expect("user exists");
    assert_eq!(user.name, "After");
    assert_eq!(user.email, "after@example.com");
    // Password untouched when no new hash is supplied
    assert_eq!(user.password_hash, "old-hash");

    store
        .update_user(id, "After", "after@example.com", Some("new-hash"))
        .await
        .expect("should update");
    let user = store
        .get_user_by_id(id)
        .await
        .expect("should query")
        .expect("user exists");
    assert_eq!(user.password_hash, "new-hash");

    store.touch_last_login(id).await.expect("should touch");
    let user = store
        .get_user_by_id(id)
        .await
        .expect("should query")
        .expect("user exists");
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn test_delete_user_clears_assignments() {
    let store = create_test_store().await;

    let user_id = store
        .create_user("Gone", "gone@example.com", "hash")
        .await
        .expect("should create user");
    let role_id = store
        .create_role("temp", &[])
        .await
        .expect("should create role");
    store
        .assign_role(user_id, role_id)
        .await
        .expect("should assign");

    store.delete_user(user_id).await.expect("should delete");

    assert!(store
        .get_user_by_id(user_id)
        .await
        .expect("should query")
        .is_none());
    let roles = store
        .roles_for_user(user_id)
        .await
        .expect("should query roles");
    assert!(roles.is_empty());
}

#[tokio::test]
async fn test_list_users_pagination() {
    let store = create_test_store().await;

    for i in 0..15 {
        store
            .create_user(&format!("User {}", i), &format!("u{}@example.com", i), "h")
            .await
            .expect("should create user");
    }

    assert_eq!(store.count_users().await.expect("should count"), 15);

    let first = store.list_users(1, 10).await.expect("should list");
    assert_eq!(first.len(), 10);

    let second = store.list_users(2, 10).await.expect("should list");
    assert_eq!(second.len(), 5);

    // Pages do not overlap
    assert!(first.iter().all(|u| second.iter().all(|v| v.id != u.id)));
}

// ============= Roles =============

#[tokio::test]
async fn test_role_roundtrip_and_assignment() {
    let store = create_test_store().await;

    let role_id = store
        .create_role("auditor", &["audit:read".to_string()])
        .await
        .expect("should create role");

    let role = store
        .get_role_by_name("auditor")
        .await
        .expect("should query")
        .expect("role exists");
    assert_eq!(role.id, role_id);
    assert_eq!(role.permissions, vec!["audit:read".to_string()]);

    store
        .update_role(role_id, "auditor", &["audit:read".to_string(), "audit:export".to_string()])
        .await
        .expect("should update");
    let role = store
        .get_role_by_id(role_id)
        .await
        .expect("should query")
        .expect("role exists");
    assert_eq!(role.permissions.len(), 2);

    let user_id = store
        .create_user("Member", "member@example.com", "hash")
        .await
        .expect("should create user");

    store
        .assign_role(user_id, role_id)
        .await
        .expect("should assign");
    // Assigning again is a no-op, not an error
    store
        .assign_role(user_id, role_id)
        .await
        .expect("re-assign should be idempotent");

    let roles = store
        .roles_for_user(user_id)
        .await
        .expect("should query roles");
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "auditor");
}

#[tokio::test]
async fn test_duplicate_role_name_rejected_by_store() {
    let store = create_test_store().await;

    store
        .create_role("ops", &[])
        .await
        .expect("should create role");
    assert!(store.create_role("ops", &[]).await.is_err());
}

// ============= Audit Trail =============

#[tokio::test]
async fn test_audit_append_ordering_and_filters() {
    let store = create_test_store().await;

    let alice = store
        .create_user("Alice", "alice@example.com", "h")
        .await
        .expect("should create user");
    let bob = store
        .create_user("Bob", "bob@example.com", "h")
        .await
        .expect("should create user");

    let details = serde_json::json!({ "userId": "3" });
    store
        .append_audit("CREATE_USER", "User", Some(3), Some(&details), alice, 1_000)
        .await
        .expect("should append");
    store
        .append_audit("DELETE_USER", "User", Some(3), None, alice, 2_000)
        .await
        .expect("should append");
    store
        .append_audit("LOGIN", "User", Some(bob), None, bob, 3_000)
        .await
        .expect("should append");

    // Newest first
    let all = store
        .list_audit(&AuditFilter::default(), 1, 10)
        .await
        .expect("should list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].action, "LOGIN");
    assert_eq!(all[2].action, "CREATE_USER");
    assert_eq!(all[2].details, Some(details));
    assert_eq!(all[2].target_id, Some(3));
    assert_eq!(
        all[0].actor.as_ref().map(|a| a.email.as_str()),
        Some("bob@example.com")
    );

    // Actor filter
    let filter = AuditFilter {
        actor_id: Some(alice),
        ..Default::default()
    };
    assert_eq!(store.count_audit(&filter).await.expect("count"), 2);

    // Action filter
    let filter = AuditFilter {
        action: Some("LOGIN".to_string()),
        ..Default::default()
    };
    let logins = store.list_audit(&filter, 1, 10).await.expect("should list");
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].actor_id, bob);

    // Inclusive timestamp range
    let filter = AuditFilter {
        from: Some(1_000),
        to: Some(2_000),
        ..Default::default()
    };
    assert_eq!(store.count_audit(&filter).await.expect("count"), 2);

    // Pagination
    let page = store
        .list_audit(&AuditFilter::default(), 2, 2)
        .await
        .expect("should list");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].action, "CREATE_USER");
}

#[tokio::test]
async fn test_audit_actor_survives_user_deletion() {
    let store = create_test_store().await;

    let actor = store
        .create_user("Actor", "actor@example.com", "h")
        .await
        .expect("should create user");
    store
        .append_audit("DELETE_USER", "User", Some(99), None, actor, 1_000)
        .await
        .expect("should append");

    store.delete_user(actor).await.expect("should delete");

    // The record keeps the original actor id; the embedded actor is gone
    let all = store
        .list_audit(&AuditFilter::default(), 1, 10)
        .await
        .expect("should list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].actor_id, actor);
    assert!(all[0].actor.is_none());
}

#[tokio::test]
async fn test_count_recent_logins() {
    let store = create_test_store().await;

    let user = store
        .create_user("Login", "login@example.com", "h")
        .await
        .expect("should create user");

    store
        .append_audit("LOGIN", "User", Some(user), None, user, 1_000)
        .await
        .expect("should append");
    store
        .append_audit("LOGIN", "User", Some(user), None, user, 5_000)
        .await
        .expect("should append");
    store
        .append_audit("CREATE_USER", "User", None, None, user, 6_000)
        .await
        .expect("should append");

    assert_eq!(store.count_recent_logins(2_000).await.expect("count"), 1);
    assert_eq!(store.count_recent_logins(0).await.expect("count"), 2);
}

// ============= Seeding =============

#[tokio::test]
async fn test_seed_is_idempotent() {
    let store = create_test_store().await;
    let auth = test_auth_service();

    store.seed(&auth).await.expect("first seed");
    store.seed(&auth).await.expect("second seed");

    assert_eq!(store.count_users().await.expect("count"), 1);
    assert_eq!(store.count_roles().await.expect("count"), 1);

    let admin = store
        .get_user_by_email(SEED_ADMIN_EMAIL)
        .await
        .expect("should query")
        .expect("admin exists");
    let roles = store
        .roles_for_user(admin.id)
        .await
        .expect("should query roles");
    assert!(roles.iter().any(|r| r.name == SUPERADMIN_ROLE));

    // Seeded password is stored hashed and verifies
    assert_ne!(admin.password_hash, "Test1234!");
    assert!(auth
        .verify_password("Test1234!", &admin.password_hash)
        .expect("should verify"));
}

// ============= File-backed store =============

#[tokio::test]
async fn test_file_backed_store_persists() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("warden-test.db");
    let path = path.to_str().expect("utf-8 path");

    {
        let store = Store::new_local(path).await.expect("should open store");
        store
            .create_user("Durable", "durable@example.com", "hash")
            .await
            .expect("should create user");
    }

    let reopened = Store::new_local(path).await.expect("should reopen store");
    let user = reopened
        .get_user_by_email("durable@example.com")
        .await
        .expect("should query")
        .expect("user persisted");
    assert_eq!(user.name, "Durable");
}
