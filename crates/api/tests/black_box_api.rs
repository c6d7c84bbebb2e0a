use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use meridian_api::app::build_app;
use meridian_api::config::ApiConfig;
use meridian_auth::{AccessClaims, PrincipalRecord, RefreshToken, ResourceKind, Role};
use meridian_core::{ClientId, ResourceId, UserId};
use meridian_infra::{MemoryStores, ResourceRecord, Stores};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    stores: MemoryStores,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the same router as prod, but in-memory and on an ephemeral
        // port. The kept MemoryStores handle shares state with the server.
        let stores = MemoryStores::new();
        let app = build_app(
            ApiConfig::for_tests(JWT_SECRET),
            Stores::InMemory(stores.clone()),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            stores,
            handle,
        }
    }

    fn seed_principal(&self, role: Role, client_id: Option<ClientId>) -> UserId {
        let id = UserId::new();
        self.stores.insert_principal(PrincipalRecord {
            id,
            email: format!("{}@example.com", id),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            is_active: true,
            client_id,
        });
        id
    }

    fn seed_inactive_principal(&self, role: Role) -> UserId {
        let id = UserId::new();
        self.stores.insert_principal(PrincipalRecord {
            id,
            email: format!("{}@example.com", id),
            first_name: "Gone".to_string(),
            last_name: "User".to_string(),
            role,
            is_active: false,
            client_id: None,
        });
        id
    }

    fn seed_resource(
        &self,
        kind: ResourceKind,
        owner_id: Option<UserId>,
        client_id: Option<ClientId>,
    ) -> ResourceId {
        let id = ResourceId::new();
        self.stores.insert_resource(
            kind,
            ResourceRecord {
                id,
                owner_id,
                client_id,
                created_at: Utc::now(),
                data: json!({ "name": "seeded" }),
            },
        );
        id
    }

    fn seed_refresh_token(&self, user_id: UserId, ttl: ChronoDuration) -> String {
        let token = RefreshToken::issue(user_id, ttl, Utc::now());
        let value = token.token.clone();
        self.stores.insert_refresh_token(token);
        value
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn encode_claims(claims: &AccessClaims, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(user_id: UserId) -> String {
    let claims = AccessClaims::new(user_id, Utc::now(), ChronoDuration::minutes(10));
    encode_claims(&claims, JWT_SECRET)
}

fn mint_expired_jwt(user_id: UserId) -> String {
    let claims = AccessClaims::new(
        user_id,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );
    encode_claims(&claims, JWT_SECRET)
}

fn mint_jwt_with_secret(user_id: UserId, secret: &str) -> String {
    let claims = AccessClaims::new(user_id, Utc::now(), ChronoDuration::minutes(10));
    encode_claims(&claims, secret)
}

#[tokio::test]
async fn missing_or_malformed_authorization_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/me", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"No token provided"}"#);

    let res = client
        .get(format!("{}/me", srv.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Invalid token"}"#);

    let res = client
        .get(format!("{}/me", srv.base_url))
        .header("Authorization", "Bearer ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_tokens_and_deactivated_accounts_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let inactive = srv.seed_inactive_principal(Role::SalesRepresentative);
    let tokens = vec![
        "garbage.token.value".to_string(),
        mint_jwt_with_secret(inactive, "wrong-secret"),
        mint_expired_jwt(inactive),
        // Valid signature and window, but the account is deactivated.
        mint_jwt(inactive),
        // Valid token for a principal that does not exist at all.
        mint_jwt(UserId::new()),
    ];

    let mut bodies = Vec::new();
    for token in tokens {
        let res = client
            .get(format!("{}/me", srv.base_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        bodies.push(res.text().await.unwrap());
    }

    for body in &bodies {
        assert_eq!(body, &bodies[0], "401 bodies must not leak the failure cause");
    }
}

#[tokio::test]
async fn me_round_trips_the_principal() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let client_id = ClientId::new();
    let user_id = srv.seed_principal(Role::ClientAdmin, Some(client_id));

    let res = client
        .get(format!("{}/me", srv.base_url))
        .bearer_auth(mint_jwt(user_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["role"], "CLIENT_ADMIN");
    assert_eq!(body["clientId"], client_id.to_string());
}

#[tokio::test]
async fn role_outside_the_allow_list_is_forbidden_without_side_effects() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let portal_user = srv.seed_principal(Role::ClientUser, Some(ClientId::new()));
    let admin = srv.seed_principal(Role::SystemAdmin, None);

    // Portal users may not create leads.
    let res = client
        .post(format!("{}/leads", srv.base_url))
        .bearer_auth(mint_jwt(portal_user))
        .json(&json!({ "data": { "name": "Smuggled lead" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Insufficient role"}"#);

    // The handler never ran: nothing was created.
    let res = client
        .get(format!("{}/leads", srv.base_url))
        .bearer_auth(mint_jwt(admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn elevated_roles_bypass_row_level_checks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let stranger = UserId::new();
    let lead = srv.seed_resource(ResourceKind::Lead, Some(stranger), None);

    for role in [Role::SystemAdmin, Role::SalesDirector, Role::ProjectDirector] {
        let supervisor = srv.seed_principal(role, None);
        let res = client
            .get(format!("{}/leads/{}", srv.base_url, lead))
            .bearer_auth(mint_jwt(supervisor))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{role} must bypass ownership");
    }
}

#[tokio::test]
async fn owner_is_granted_and_non_owner_is_forbidden() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);
    let other_rep = srv.seed_principal(Role::SalesRepresentative, None);
    let own_lead = srv.seed_resource(ResourceKind::Lead, Some(rep), None);
    let other_lead = srv.seed_resource(ResourceKind::Lead, Some(other_rep), None);

    let res = client
        .get(format!("{}/leads/{}", srv.base_url, own_lead))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Reading a colleague's lead: role gate passes, ownership gate refuses.
    let res = client
        .get(format!("{}/leads/{}", srv.base_url, other_lead))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":"No access to this resource"}"#
    );
}

#[tokio::test]
async fn client_user_is_granted_on_tenant_match() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let company = ClientId::new();
    let staff = srv.seed_principal(Role::AiProjectManager, None);
    let portal_user = srv.seed_principal(Role::ClientUser, Some(company));
    let other_portal_user = srv.seed_principal(Role::ClientUser, Some(ClientId::new()));

    // Ticket owned by staff, belonging to the portal user's company.
    let ticket = srv.seed_resource(ResourceKind::Ticket, Some(staff), Some(company));

    let res = client
        .get(format!("{}/tickets/{}", srv.base_url, ticket))
        .bearer_auth(mint_jwt(portal_user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/tickets/{}", srv.base_url, ticket))
        .bearer_auth(mint_jwt(other_portal_user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_resource_is_not_found_not_forbidden() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);
    let director = srv.seed_principal(Role::SalesDirector, None);
    let missing = ResourceId::new();

    // Non-elevated: the ownership gate reports absence.
    let res = client
        .get(format!("{}/leads/{}", srv.base_url, missing))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":"Resource not found"}"#
    );

    // Elevated: the gate is bypassed before the existence check; the
    // handler's own read reports absence instead.
    let res = client
        .get(format!("{}/leads/{}", srv.base_url, missing))
        .bearer_auth(mint_jwt(director))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_resource_id_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);

    let res = client
        .get(format!("{}/leads/not-a-uuid", srv.base_url))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":"Invalid resource id"}"#
    );
}

#[tokio::test]
async fn list_is_scoped_by_role() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);
    let other_rep = srv.seed_principal(Role::SalesRepresentative, None);
    let director = srv.seed_principal(Role::SalesDirector, None);

    srv.seed_resource(ResourceKind::Lead, Some(rep), None);
    srv.seed_resource(ResourceKind::Lead, Some(other_rep), None);
    srv.seed_resource(ResourceKind::Lead, Some(other_rep), None);

    // A representative sees only their own rows.
    let res = client
        .get(format!("{}/leads", srv.base_url))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let mine: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["ownerId"], rep.to_string());

    // A director sees everything.
    let res = client
        .get(format!("{}/leads", srv.base_url))
        .bearer_auth(mint_jwt(director))
        .send()
        .await
        .unwrap();
    let all: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn portal_list_is_scoped_to_the_client_company() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let company = ClientId::new();
    let staff = srv.seed_principal(Role::AiProjectManager, None);
    let portal_user = srv.seed_principal(Role::ClientUser, Some(company));

    srv.seed_resource(ResourceKind::Ticket, Some(staff), Some(company));
    srv.seed_resource(ResourceKind::Ticket, Some(staff), Some(ClientId::new()));
    srv.seed_resource(ResourceKind::Ticket, Some(staff), None);

    let res = client
        .get(format!("{}/tickets", srv.base_url))
        .bearer_auth(mint_jwt(portal_user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let visible: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["clientId"], company.to_string());
}

#[tokio::test]
async fn create_assigns_ownership_to_the_caller() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);

    let res = client
        .post(format!("{}/leads", srv.base_url))
        .bearer_auth(mint_jwt(rep))
        .json(&json!({ "data": { "name": "Acme Corp", "source": "webinar" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["ownerId"], rep.to_string());
    let id = created["id"].as_str().unwrap();

    // The creator can immediately read their row back.
    let res = client
        .get(format!("{}/leads/{}", srv.base_url, id))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["data"]["name"], "Acme Corp");
}

#[tokio::test]
async fn update_and_delete_respect_the_ownership_gate() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let rep = srv.seed_principal(Role::SalesRepresentative, None);
    let other_rep = srv.seed_principal(Role::SalesRepresentative, None);
    let lead = srv.seed_resource(ResourceKind::Lead, Some(rep), None);

    // A colleague may neither update nor delete the row.
    let res = client
        .put(format!("{}/leads/{}", srv.base_url, lead))
        .bearer_auth(mint_jwt(other_rep))
        .json(&json!({ "data": { "name": "hijacked" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{}/leads/{}", srv.base_url, lead))
        .bearer_auth(mint_jwt(other_rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The owner may do both.
    let res = client
        .put(format!("{}/leads/{}", srv.base_url, lead))
        .bearer_auth(mint_jwt(rep))
        .json(&json!({ "data": { "name": "Acme Corp (qualified)" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["data"]["name"], "Acme Corp (qualified)");

    let res = client
        .delete(format!("{}/leads/{}", srv.base_url, lead))
        .bearer_auth(mint_jwt(rep))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn refresh_exchange_is_single_use() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user_id = srv.seed_principal(Role::SalesRepresentative, None);
    let refresh_token = srv.seed_refresh_token(user_id, ChronoDuration::days(1));

    // First exchange succeeds and rotates.
    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let access_token = body["accessToken"].as_str().unwrap().to_string();
    let rotated = body["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh_token);

    // The minted access token authenticates as the right principal.
    let res = client
        .get(format!("{}/me", srv.base_url))
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["id"], user_id.to_string());

    // Replaying the consumed value fails.
    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":"Invalid refresh token"}"#
    );

    // The rotated value is good for exactly one further exchange.
    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refreshToken": rotated }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_and_still_consumed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user_id = srv.seed_principal(Role::SalesRepresentative, None);
    let refresh_token = srv.seed_refresh_token(user_id, ChronoDuration::seconds(-1));

    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The failed exchange burned the record.
    assert!(srv.stores.consume_refresh_token(&refresh_token).is_none());
}

#[tokio::test]
async fn refresh_for_a_deactivated_principal_fails() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user_id = srv.seed_inactive_principal(Role::SalesRepresentative);
    let refresh_token = srv.seed_refresh_token(user_id, ChronoDuration::days(1));

    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
