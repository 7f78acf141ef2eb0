#![allow(dead_code)]

use chrono::Duration;
use company_service::db::InMemoryCompanyRepository;
use company_service::models::Company;
use company_service::services::CompanyService;
use company_service::AppState;
use crypto_core::test_utils::test_key_pair;
use crypto_core::{TokenIssuer, TokenVerifier};
use std::sync::Arc;

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const ROOT: &str = "root@example.com";

pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<InMemoryCompanyRepository>,
}

pub fn context() -> TestContext {
    context_with_auth_endpoint(true)
}

pub fn context_with_auth_endpoint(enabled: bool) -> TestContext {
    let keys = test_key_pair();
    let repo = Arc::new(InMemoryCompanyRepository::new());
    let service = CompanyService::new(repo.clone());
    let state = AppState::new(
        service,
        TokenIssuer::new(&keys, Duration::minutes(60)).unwrap(),
        TokenVerifier::new(&keys).unwrap(),
        enabled,
    );
    TestContext { state, repo }
}

/// `Authorization` header value for `user` holding `roles` (unprefixed).
pub fn bearer(user: &str, roles: &[&str]) -> String {
    let authorities: Vec<String> = roles.iter().map(|r| format!("ROLE_{}", r)).collect();
    let token = TokenIssuer::new(&test_key_pair(), Duration::minutes(60))
        .unwrap()
        .issue(user, &authorities)
        .unwrap();
    format!("Bearer {}", token)
}

pub async fn insert_company(ctx: &TestContext, name: &str, owner: &str) -> Company {
    use company_service::db::CompanyRepository;
    ctx.repo.save(Company::new(name, owner)).await.unwrap()
}
