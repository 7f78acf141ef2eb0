/// Company business logic
///
/// Sits between handlers and the repository: stamps ownership and audit
/// fields, and bounds listing size. Authorization decisions live in
/// `middleware::permissions`.
use chrono::Utc;
use std::sync::Arc;

use crate::db::CompanyRepository;
use crate::error::Result;
use crate::models::{Company, CompanyRequest};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`; zero or absent means the default.
pub fn page_size(requested: Option<usize>) -> usize {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE)
}

pub struct CompanyService {
    repo: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(repo: Arc<dyn CompanyRepository>) -> Self {
        Self { repo }
    }

    /// Apply `draft` on behalf of `actor`.
    ///
    /// With no `existing` record a new company is created and owned by
    /// `actor`. Otherwise id, owner and creation date are kept and only the
    /// writable fields and modification stamp change.
    pub async fn save(
        &self,
        draft: CompanyRequest,
        existing: Option<Company>,
        actor: &str,
    ) -> Result<Company> {
        let company = match existing {
            None => {
                let mut company = Company::new(draft.name, actor);
                company.activated = draft.activated;
                company
            }
            Some(current) => Company {
                name: draft.name,
                activated: draft.activated,
                last_modified_by_user: actor.to_string(),
                last_modified_date: Utc::now(),
                ..current
            },
        };

        let saved = self.repo.save(company).await?;
        tracing::info!(company_id = %saved.id, actor = %actor, "Saved company");
        Ok(saved)
    }

    pub async fn save_all(&self, companies: Vec<Company>) -> Result<Vec<Company>> {
        Ok(self.repo.save_all(companies).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Company>> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_all_active(&self, page_size: usize) -> Result<Vec<Company>> {
        Ok(self.repo.find_active(page_size).await?)
    }

    pub async fn find_active_by_user(&self, user: &str, page_size: usize) -> Result<Vec<Company>> {
        Ok(self.repo.find_active_by_user(user, page_size).await?)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.repo.delete_by_id(id).await?;
        tracing::info!(company_id = %id, "Deleted company");
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.repo.count().await?)
    }
}
