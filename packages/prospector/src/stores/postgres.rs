//! PostgreSQL storage implementation.
//!
//! Production backend. The two concurrency-sensitive operations are pushed
//! into SQL where they are safe across processes: `items_processed` is a
//! single-row `SET x = x + 1`, and the listing claim is a conditional
//! `UPDATE ... WHERE processed = FALSE` whose affected-row count decides
//! the winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::traits::store::ProspectStore;
use crate::types::{
    AssetType, Job, JobStatus, NewRawListing, Opportunity, PlatformCategory, RawListing,
    RegionalPricing, Source,
};

/// PostgreSQL-backed store.
pub struct PostgresStore {
    pool: PgPool,
}

fn storage_err<E>(e: E) -> PipelineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    PipelineError::Storage(Box::new(e))
}

fn bad_label(table: &str, value: &str) -> PipelineError {
    PipelineError::Storage(format!("unknown {table} label: {value}").into())
}

impl PostgresStore {
    /// Connect with the given database URL and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(storage_err)?;

        Self::from_pool(pool).await
    }

    /// Create from an existing connection pool (avoids duplicate pools when
    /// the host application already has one).
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scraping_sources (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                platform_category TEXT NOT NULL,
                base_url TEXT NOT NULL,
                search_paths JSONB NOT NULL DEFAULT '[""]',
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                scrape_frequency TEXT NOT NULL DEFAULT 'daily',
                last_scraped_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scraping_jobs (
                id UUID PRIMARY KEY,
                source_id UUID NOT NULL REFERENCES scraping_sources(id),
                status TEXT NOT NULL,
                started_at TIMESTAMPTZ NOT NULL,
                completed_at TIMESTAMPTZ,
                items_found INTEGER NOT NULL DEFAULT 0,
                items_processed INTEGER NOT NULL DEFAULT 0,
                error_message TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_listings (
                id UUID PRIMARY KEY,
                job_id UUID NOT NULL REFERENCES scraping_jobs(id),
                source_url TEXT NOT NULL,
                discovery_data JSONB NOT NULL DEFAULT 'null',
                processed BOOLEAN NOT NULL DEFAULT FALSE,
                parsed_data JSONB,
                opportunity_id UUID,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS raw_listings_unprocessed_idx
            ON raw_listings (created_at, id) WHERE processed = FALSE
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS opportunities (
                id UUID PRIMARY KEY,
                asset_type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                listed_price DOUBLE PRECISION NOT NULL,
                estimated_value DOUBLE PRECISION NOT NULL,
                profit_potential DOUBLE PRECISION NOT NULL,
                profit_percentage DOUBLE PRECISION NOT NULL,
                county TEXT NOT NULL,
                city TEXT,
                district TEXT,
                seller_name TEXT,
                seller_contact TEXT,
                source_url TEXT NOT NULL,
                source_platform TEXT NOT NULL,
                ai_confidence_score DOUBLE PRECISION NOT NULL,
                improvement_recommendations JSONB NOT NULL DEFAULT '[]',
                improvement_cost_estimate DOUBLE PRECISION NOT NULL,
                net_profit_potential DOUBLE PRECISION NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                scraped_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regional_pricing (
                id UUID PRIMARY KEY,
                county TEXT NOT NULL,
                city TEXT,
                district TEXT,
                asset_type TEXT NOT NULL,
                average_price DOUBLE PRECISION NOT NULL,
                min_price DOUBLE PRECISION,
                max_price DOUBLE PRECISION,
                sample_size INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    fn source_from_row(row: &sqlx::postgres::PgRow) -> Result<Source> {
        let category: String = row.get("platform_category");
        Ok(Source {
            id: row.get("id"),
            name: row.get("name"),
            platform_category: PlatformCategory::parse(&category)
                .ok_or_else(|| bad_label("platform_category", &category))?,
            base_url: row.get("base_url"),
            search_paths: serde_json::from_value(row.get("search_paths"))?,
            is_active: row.get("is_active"),
            scrape_frequency: row.get("scrape_frequency"),
            last_scraped_at: row.get("last_scraped_at"),
        })
    }

    fn listing_from_row(row: &sqlx::postgres::PgRow) -> RawListing {
        RawListing {
            id: row.get("id"),
            job_id: row.get("job_id"),
            source_url: row.get("source_url"),
            discovery_data: row.get("discovery_data"),
            processed: row.get("processed"),
            parsed_data: row.get("parsed_data"),
            opportunity_id: row.get("opportunity_id"),
            created_at: row.get("created_at"),
        }
    }

    /// Current status of a job, for transition error reporting.
    async fn job_status(&self, job_id: Uuid) -> Result<JobStatus> {
        let row = sqlx::query("SELECT status FROM scraping_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

        let status: String = row.get("status");
        JobStatus::parse(&status).ok_or_else(|| bad_label("status", &status))
    }

    /// Read a job back (diagnostics and tests).
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT id, source_id, status, started_at, completed_at,
                   items_found, items_processed, error_message
            FROM scraping_jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.map(|r| {
            let status: String = r.get("status");
            Ok(Job {
                id: r.get("id"),
                source_id: r.get("source_id"),
                status: JobStatus::parse(&status).ok_or_else(|| bad_label("status", &status))?,
                started_at: r.get("started_at"),
                completed_at: r.get("completed_at"),
                items_found: r.get("items_found"),
                items_processed: r.get("items_processed"),
                error_message: r.get("error_message"),
            })
        })
        .transpose()
    }
}

#[async_trait]
impl ProspectStore for PostgresStore {
    async fn active_sources(&self, source_id: Option<Uuid>) -> Result<Vec<Source>> {
        let rows = match source_id {
            Some(id) => {
                sqlx::query(
                    r#"
                    SELECT id, name, platform_category, base_url, search_paths,
                           is_active, scrape_frequency, last_scraped_at
                    FROM scraping_sources
                    WHERE is_active = TRUE AND id = $1
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, platform_category, base_url, search_paths,
                           is_active, scrape_frequency, last_scraped_at
                    FROM scraping_sources
                    WHERE is_active = TRUE
                    ORDER BY name
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage_err)?;

        rows.iter().map(Self::source_from_row).collect()
    }

    async fn touch_source(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE scraping_sources SET last_scraped_at = $2 WHERE id = $1")
            .bind(source_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn create_job(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scraping_jobs (
                id, source_id, status, started_at, completed_at,
                items_found, items_processed, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job.id)
        .bind(job.source_id)
        .bind(job.status.as_str())
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.items_found)
        .bind(job.items_processed)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn complete_job(&self, job_id: Uuid, items_found: i32) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE scraping_jobs
            SET status = 'completed', completed_at = now(), items_found = $2
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(job_id)
        .bind(items_found)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if updated.rows_affected() == 0 {
            return Err(PipelineError::InvalidTransition {
                from: self.job_status(job_id).await?,
                to: JobStatus::Completed,
            });
        }
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE scraping_jobs
            SET status = 'failed', completed_at = now(), error_message = $2
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(job_id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if updated.rows_affected() == 0 {
            return Err(PipelineError::InvalidTransition {
                from: self.job_status(job_id).await?,
                to: JobStatus::Failed,
            });
        }
        Ok(())
    }

    async fn increment_job_processed(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE scraping_jobs SET items_processed = items_processed + 1 WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn insert_raw_listings(&self, listings: &[NewRawListing]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        for listing in listings {
            sqlx::query(
                r#"
                INSERT INTO raw_listings (id, job_id, source_url, discovery_data, processed)
                VALUES ($1, $2, $3, $4, FALSE)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(listing.job_id)
            .bind(&listing.source_url)
            .bind(&listing.discovery_data)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(listings.len())
    }

    async fn unprocessed_listings(&self, limit: usize) -> Result<Vec<RawListing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_id, source_url, discovery_data, processed,
                   parsed_data, opportunity_id, created_at
            FROM raw_listings
            WHERE processed = FALSE
            ORDER BY created_at, id
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.iter().map(Self::listing_from_row).collect())
    }

    async fn claim_listing(
        &self,
        listing_id: Uuid,
        parsed_data: &serde_json::Value,
        opportunity_id: Uuid,
    ) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE raw_listings
            SET processed = TRUE, parsed_data = $2, opportunity_id = $3
            WHERE id = $1 AND processed = FALSE
            "#,
        )
        .bind(listing_id)
        .bind(parsed_data)
        .bind(opportunity_id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(updated.rows_affected() == 1)
    }

    async fn insert_opportunity(&self, opportunity: &Opportunity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO opportunities (
                id, asset_type, title, description, listed_price, estimated_value,
                profit_potential, profit_percentage, county, city, district,
                seller_name, seller_contact, source_url, source_platform,
                ai_confidence_score, improvement_recommendations,
                improvement_cost_estimate, net_profit_potential, status,
                scraped_at, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(opportunity.id)
        .bind(opportunity.asset_type.as_str())
        .bind(&opportunity.title)
        .bind(&opportunity.description)
        .bind(opportunity.listed_price)
        .bind(opportunity.estimated_value)
        .bind(opportunity.profit_potential)
        .bind(opportunity.profit_percentage)
        .bind(&opportunity.county)
        .bind(&opportunity.city)
        .bind(&opportunity.district)
        .bind(&opportunity.seller_name)
        .bind(&opportunity.seller_contact)
        .bind(&opportunity.source_url)
        .bind(&opportunity.source_platform)
        .bind(opportunity.ai_confidence_score)
        .bind(serde_json::to_value(&opportunity.improvement_recommendations)?)
        .bind(opportunity.improvement_cost_estimate)
        .bind(opportunity.net_profit_potential)
        .bind(opportunity.status.as_str())
        .bind(opportunity.scraped_at)
        .bind(opportunity.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn regional_pricing_sample(&self, limit: usize) -> Result<Vec<RegionalPricing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, county, city, district, asset_type, average_price,
                   min_price, max_price, sample_size
            FROM regional_pricing
            ORDER BY county, asset_type
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter()
            .map(|r| {
                let asset_type: String = r.get("asset_type");
                Ok(RegionalPricing {
                    id: r.get("id"),
                    county: r.get("county"),
                    city: r.get("city"),
                    district: r.get("district"),
                    asset_type: AssetType::parse(&asset_type)
                        .ok_or_else(|| bad_label("asset_type", &asset_type))?,
                    average_price: r.get("average_price"),
                    min_price: r.get("min_price"),
                    max_price: r.get("max_price"),
                    sample_size: r.get("sample_size"),
                })
            })
            .collect()
    }
}
