//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::PgPool;
use tracing::info;

use crate::auth::AuthService;
use crate::cache::CacheLayer;
use crate::config::Config;
use crate::db;
use crate::tasks::{CronService, EmailService, Queue, RedisQueue};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Redis client for the task queue, cron lock and cache.
    redis: RedisClient,

    /// Two-tier cache layer (Moka L1 + Redis L2).
    cache: CacheLayer,

    /// Bearer token verification.
    auth: AuthService,

    /// Background task queue.
    queue: Arc<dyn Queue>,

    /// Cron service for the announcement job.
    cron: Arc<CronService>,

    /// Email service (available when SMTP is configured).
    email: Option<Arc<EmailService>>,

    /// Secret for the cron endpoint.
    cron_key: Option<String>,
}

impl AppState {
    /// Create new application state with database connections.
    ///
    /// Runs pending migrations and checks Redis before returning.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let redis = RedisClient::open(config.redis_url.as_str())
            .context("failed to create Redis client")?;

        // Test Redis connection
        let mut conn = redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Redis")?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;

        let state = Self::from_parts(db, redis, config)?;

        info!(
            email = state.email().is_some(),
            cron_endpoint = config.cron_key.is_some(),
            "application state initialized"
        );

        Ok(state)
    }

    /// Assemble state from already-created clients.
    ///
    /// Does not touch the network; integration tests pair it with lazy pools.
    pub fn from_parts(db: PgPool, redis: RedisClient, config: &Config) -> Result<Self> {
        let cache = CacheLayer::new(redis.clone());
        let auth = AuthService::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone());
        let queue: Arc<dyn Queue> = Arc::new(RedisQueue::new(redis.clone()));
        let cron = Arc::new(CronService::new(redis.clone(), db.clone(), cache.clone()));
        let email = EmailService::from_config(config)
            .context("failed to create email service")?
            .map(Arc::new);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                redis,
                cache,
                auth,
                queue,
                cron,
                email,
                cron_key: config.cron_key.clone(),
            }),
        })
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the Redis client.
    pub fn redis(&self) -> &RedisClient {
        &self.inner.redis
    }

    /// Get the cache layer.
    pub fn cache(&self) -> &CacheLayer {
        &self.inner.cache
    }

    /// Get the token verifier.
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get the background task queue.
    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.inner.queue
    }

    /// Get the cron service.
    pub fn cron(&self) -> &Arc<CronService> {
        &self.inner.cron
    }

    /// Get the email service (None if SMTP is not configured).
    pub fn email(&self) -> Option<&Arc<EmailService>> {
        self.inner.email.as_ref()
    }

    /// Secret the cron endpoint expects.
    pub fn cron_key(&self) -> Option<&str> {
        self.inner.cron_key.as_deref()
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }

    /// Check if Redis is healthy.
    pub async fn redis_healthy(&self) -> bool {
        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            return false;
        };

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
