use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;

/// The authenticated user, as reported by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Narrow view of the identity provider. Gates access upstream of the
/// pipeline; the pipeline itself assumes access was already granted.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, bearer_token: &str) -> anyhow::Result<Option<User>>;
}

/// Narrow view of the subscription checker.
#[async_trait]
pub trait SubscriptionChecker: Send + Sync {
    async fn has_active_plan(&self, email: &str) -> anyhow::Result<bool>;
}

/// Identity provider that verifies the bearer token against a hosted auth
/// service and returns the user's id and primary verified email.
pub struct HttpIdentityProvider {
    client: Client,
    endpoint: String,
}

impl HttpIdentityProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("IDENTITY_PROVIDER_URL")
            .map_err(|_| anyhow::anyhow!("IDENTITY_PROVIDER_URL not set"))?;
        Ok(Self::new(endpoint))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_user(&self, bearer_token: &str) -> anyhow::Result<Option<User>> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(bearer_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("identity provider responded with {}", response.status());
        }

        let user: User = response.json().await?;
        Ok(Some(user))
    }
}

/// Subscription checker backed by the payments table: a user has an active
/// plan when a completed payment exists for their email.
pub struct PaymentsPlanChecker {
    pool: PgPool,
}

impl PaymentsPlanChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionChecker for PaymentsPlanChecker {
    async fn has_active_plan(&self, email: &str) -> anyhow::Result<bool> {
        let active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM payments
                WHERE user_email = $1 AND status = 'complete'
            )
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "plan lookup failed");
            anyhow::anyhow!("plan lookup failed: {}", e)
        })?;

        Ok(active)
    }
}
