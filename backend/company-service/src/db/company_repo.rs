use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::models::Company;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Document-style storage for companies.
///
/// Listings return activated companies only, oldest first, capped at `limit`.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Insert, or replace the record with the same id.
    async fn save(&self, company: Company) -> RepoResult<Company>;

    async fn save_all(&self, companies: Vec<Company>) -> RepoResult<Vec<Company>>;

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Company>>;

    async fn find_active(&self, limit: usize) -> RepoResult<Vec<Company>>;

    async fn find_active_by_user(&self, user: &str, limit: usize) -> RepoResult<Vec<Company>>;

    /// Deleting an unknown id is not an error.
    async fn delete_by_id(&self, id: &str) -> RepoResult<()>;

    async fn count(&self) -> RepoResult<u64>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub struct PgCompanyRepository {
    pool: PgPool,
}

const COMPANY_COLUMNS: &str = "id, name, created_by_user, activated, created_date, \
                               last_modified_by_user, last_modified_date";

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `companies` table and its listing index if missing.
    pub async fn ensure_schema(&self) -> RepoResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id                    TEXT PRIMARY KEY,
                name                  TEXT NOT NULL,
                created_by_user       TEXT NOT NULL,
                activated             BOOLEAN NOT NULL DEFAULT TRUE,
                created_date          TIMESTAMPTZ NOT NULL,
                last_modified_by_user TEXT NOT NULL,
                last_modified_date    TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_companies_active_owner
                ON companies (created_by_user, created_date)
                WHERE activated
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("companies schema ready");
        Ok(())
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn save(&self, company: Company) -> RepoResult<Company> {
        let sql = format!(
            r#"
            INSERT INTO companies ({COMPANY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                activated = EXCLUDED.activated,
                last_modified_by_user = EXCLUDED.last_modified_by_user,
                last_modified_date = EXCLUDED.last_modified_date
            RETURNING {COMPANY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Company>(&sql)
            .bind(&company.id)
            .bind(&company.name)
            .bind(&company.created_by_user)
            .bind(company.activated)
            .bind(company.created_date)
            .bind(&company.last_modified_by_user)
            .bind(company.last_modified_date)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_all(&self, companies: Vec<Company>) -> RepoResult<Vec<Company>> {
        let mut saved = Vec::with_capacity(companies.len());
        for company in companies {
            saved.push(self.save(company).await?);
        }
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1");
        sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_active(&self, limit: usize) -> RepoResult<Vec<Company>> {
        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE activated \
             ORDER BY created_date ASC, id ASC LIMIT $1"
        );
        sqlx::query_as::<_, Company>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
    }

    async fn find_active_by_user(&self, user: &str, limit: usize) -> RepoResult<Vec<Company>> {
        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE activated AND created_by_user = $1 \
             ORDER BY created_date ASC, id ASC LIMIT $2"
        );
        sqlx::query_as::<_, Company>(&sql)
            .bind(user)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
    }

    async fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store used when no database is configured, and in tests.
///
/// Records keep insertion order, so ties on `created_date` list in the order
/// they were first saved.
#[derive(Default)]
pub struct InMemoryCompanyRepository {
    companies: RwLock<Vec<Company>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_sorted<'a>(
        companies: impl Iterator<Item = &'a Company>,
        limit: usize,
    ) -> Vec<Company> {
        let mut active: Vec<Company> = companies.filter(|c| c.activated).cloned().collect();
        active.sort_by_key(|c| c.created_date);
        active.truncate(limit);
        active
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn save(&self, company: Company) -> RepoResult<Company> {
        let mut companies = self.companies.write().await;
        match companies.iter_mut().find(|c| c.id == company.id) {
            Some(existing) => *existing = company.clone(),
            None => companies.push(company.clone()),
        }
        Ok(company)
    }

    async fn save_all(&self, companies: Vec<Company>) -> RepoResult<Vec<Company>> {
        let mut saved = Vec::with_capacity(companies.len());
        for company in companies {
            saved.push(self.save(company).await?);
        }
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_active(&self, limit: usize) -> RepoResult<Vec<Company>> {
        let companies = self.companies.read().await;
        Ok(Self::active_sorted(companies.iter(), limit))
    }

    async fn find_active_by_user(&self, user: &str, limit: usize) -> RepoResult<Vec<Company>> {
        let companies = self.companies.read().await;
        Ok(Self::active_sorted(
            companies.iter().filter(|c| c.created_by_user == user),
            limit,
        ))
    }

    async fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        self.companies.write().await.retain(|c| c.id != id);
        Ok(())
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.companies.read().await.len() as u64)
    }
}
