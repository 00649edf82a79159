//! UMKM repository
//!
//! Businesses and their products. Products are always addressed through the
//! owning UMKM so a product id from another business is never touched.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::{on_pool, DynDatabasePool, LastInsertId};
use crate::models::{ListParams, PagedResult, Umkm, UmkmInput, UmkmProduct, UmkmProductInput};

const UMKM_COLUMNS: &str = "id, name, slug, owner_name, category, description, address, phone, \
                            latitude, longitude, is_active, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, umkm_id, name, description, price, is_available, created_at, updated_at";

#[async_trait]
pub trait UmkmRepository: Send + Sync {
    /// Paged listing by name, optionally restricted to a category and to active businesses
    async fn list(
        &self,
        category: Option<&str>,
        active_only: bool,
        params: &ListParams,
    ) -> Result<PagedResult<Umkm>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Umkm>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Umkm>>;

    async fn create(&self, input: &UmkmInput, slug: &str) -> Result<Umkm>;

    async fn update(&self, id: i64, input: &UmkmInput, slug: &str) -> Result<Option<Umkm>>;

    /// Delete the business; its products cascade
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn list_products(&self, umkm_id: i64) -> Result<Vec<UmkmProduct>>;

    async fn get_product(&self, umkm_id: i64, product_id: i64) -> Result<Option<UmkmProduct>>;

    async fn create_product(&self, umkm_id: i64, input: &UmkmProductInput) -> Result<UmkmProduct>;

    async fn update_product(
        &self,
        umkm_id: i64,
        product_id: i64,
        input: &UmkmProductInput,
    ) -> Result<Option<UmkmProduct>>;

    async fn delete_product(&self, umkm_id: i64, product_id: i64) -> Result<bool>;

    async fn count_products(&self) -> Result<i64>;
}

pub struct SqlxUmkmRepository {
    pool: DynDatabasePool,
}

impl SqlxUmkmRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UmkmRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UmkmRepository for SqlxUmkmRepository {
    async fn list(
        &self,
        category: Option<&str>,
        active_only: bool,
        params: &ListParams,
    ) -> Result<PagedResult<Umkm>> {
        let category = category.filter(|c| !c.is_empty());
        let mut conditions = Vec::new();
        if active_only {
            conditions.push("is_active = 1");
        }
        if category.is_some() {
            conditions.push("LOWER(category) = LOWER(?)");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let count_sql = format!("SELECT COUNT(*) AS count FROM umkm {}", where_clause);
        let list_sql = format!(
            "SELECT {} FROM umkm {} ORDER BY name, id LIMIT ? OFFSET ?",
            UMKM_COLUMNS, where_clause
        );

        on_pool!(self.pool, |db| {
            let mut count_query = sqlx::query(&count_sql);
            if let Some(c) = category {
                count_query = count_query.bind(c);
            }
            let total: i64 = count_query
                .fetch_one(db)
                .await
                .context("Failed to count UMKM")?
                .get("count");

            let mut list_query = sqlx::query_as::<_, Umkm>(&list_sql);
            if let Some(c) = category {
                list_query = list_query.bind(c);
            }
            let items = list_query
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(db)
                .await
                .context("Failed to list UMKM")?;

            Ok(PagedResult::new(items, total, params))
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Umkm>> {
        let sql = format!("SELECT {} FROM umkm WHERE id = ?", UMKM_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Umkm>(&sql)
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to get UMKM")
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Umkm>> {
        let sql = format!("SELECT {} FROM umkm WHERE slug = ?", UMKM_COLUMNS);
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, Umkm>(&sql)
                .bind(slug)
                .fetch_optional(db)
                .await
                .context("Failed to get UMKM by slug")
        })
    }

    async fn create(&self, input: &UmkmInput, slug: &str) -> Result<Umkm> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO umkm (name, slug, owner_name, category, description, address, phone,
                                  latitude, longitude, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.owner_name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_active)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create UMKM")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_by_id(id).await?.context("UMKM missing after insert")
    }

    async fn update(&self, id: i64, input: &UmkmInput, slug: &str) -> Result<Option<Umkm>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE umkm
                SET name = ?, slug = ?, owner_name = ?, category = ?, description = ?, address = ?,
                    phone = ?, latitude = ?, longitude = ?, is_active = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.name)
            .bind(slug)
            .bind(&input.owner_name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_active)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("Failed to update UMKM")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM umkm WHERE id = ?")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to delete UMKM")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count(&self) -> Result<i64> {
        super::count_rows(&self.pool, "umkm").await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        super::slug_taken(&self.pool, "umkm", slug, exclude_id).await
    }

    async fn list_products(&self, umkm_id: i64) -> Result<Vec<UmkmProduct>> {
        let sql = format!(
            "SELECT {} FROM umkm_products WHERE umkm_id = ? ORDER BY name, id",
            PRODUCT_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, UmkmProduct>(&sql)
                .bind(umkm_id)
                .fetch_all(db)
                .await
                .context("Failed to list UMKM products")
        })
    }

    async fn get_product(&self, umkm_id: i64, product_id: i64) -> Result<Option<UmkmProduct>> {
        let sql = format!(
            "SELECT {} FROM umkm_products WHERE id = ? AND umkm_id = ?",
            PRODUCT_COLUMNS
        );
        on_pool!(self.pool, |db| {
            sqlx::query_as::<_, UmkmProduct>(&sql)
                .bind(product_id)
                .bind(umkm_id)
                .fetch_optional(db)
                .await
                .context("Failed to get UMKM product")
        })
    }

    async fn create_product(&self, umkm_id: i64, input: &UmkmProductInput) -> Result<UmkmProduct> {
        let now = Utc::now();
        let id = on_pool!(self.pool, |db| {
            let result = sqlx::query(
                r#"
                INSERT INTO umkm_products (umkm_id, name, description, price, is_available, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(umkm_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.is_available)
            .bind(now)
            .bind(now)
            .execute(db)
            .await
            .context("Failed to create UMKM product")?;
            Ok::<_, anyhow::Error>(result.insert_id())
        })?;

        self.get_product(umkm_id, id)
            .await?
            .context("UMKM product missing after insert")
    }

    async fn update_product(
        &self,
        umkm_id: i64,
        product_id: i64,
        input: &UmkmProductInput,
    ) -> Result<Option<UmkmProduct>> {
        if self.get_product(umkm_id, product_id).await?.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        on_pool!(self.pool, |db| {
            sqlx::query(
                r#"
                UPDATE umkm_products
                SET name = ?, description = ?, price = ?, is_available = ?, updated_at = ?
                WHERE id = ? AND umkm_id = ?
                "#,
            )
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.is_available)
            .bind(now)
            .bind(product_id)
            .bind(umkm_id)
            .execute(db)
            .await
            .context("Failed to update UMKM product")?;
            Ok::<_, anyhow::Error>(())
        })?;

        self.get_product(umkm_id, product_id).await
    }

    async fn delete_product(&self, umkm_id: i64, product_id: i64) -> Result<bool> {
        on_pool!(self.pool, |db| {
            let result = sqlx::query("DELETE FROM umkm_products WHERE id = ? AND umkm_id = ?")
                .bind(product_id)
                .bind(umkm_id)
                .execute(db)
                .await
                .context("Failed to delete UMKM product")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn count_products(&self) -> Result<i64> {
        super::count_rows(&self.pool, "umkm_products").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn umkm(name: &str, category: &str, is_active: bool) -> UmkmInput {
        UmkmInput {
            name: name.to_string(),
            slug: None,
            owner_name: "Bu Sri".to_string(),
            category: category.to_string(),
            description: "Usaha rumahan".to_string(),
            address: None,
            phone: Some("0812-1111-2222".to_string()),
            latitude: None,
            longitude: None,
            is_active,
        }
    }

    fn product(name: &str, price: i64) -> UmkmProductInput {
        UmkmProductInput {
            name: name.to_string(),
            description: None,
            price,
            is_available: true,
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = SqlxUmkmRepository::new(migrated_pool().await);
        repo.create(&umkm("Keripik Tempe", "kuliner", true), "keripik-tempe").await.unwrap();
        repo.create(&umkm("Anyaman Bambu", "kerajinan", true), "anyaman-bambu").await.unwrap();
        repo.create(&umkm("Wedang Uwuh", "kuliner", false), "wedang-uwuh").await.unwrap();

        let all = repo.list(None, false, &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].name, "Anyaman Bambu");

        let kuliner = repo.list(Some("Kuliner"), true, &ListParams::default()).await.unwrap();
        assert_eq!(kuliner.total, 1);
        assert_eq!(kuliner.items[0].slug, "keripik-tempe");
    }

    #[tokio::test]
    async fn test_products_scoped_to_owner() {
        let repo = SqlxUmkmRepository::new(migrated_pool().await);
        let first = repo.create(&umkm("Kopi Lereng", "kuliner", true), "kopi-lereng").await.unwrap();
        let second = repo.create(&umkm("Batik Tulis", "kerajinan", true), "batik-tulis").await.unwrap();

        let kopi = repo.create_product(first.id, &product("Kopi Bubuk", 25_000)).await.unwrap();
        repo.create_product(first.id, &product("Biji Kopi", 40_000)).await.unwrap();

        assert_eq!(repo.list_products(first.id).await.unwrap().len(), 2);
        assert!(repo.get_product(second.id, kopi.id).await.unwrap().is_none());
        assert!(repo
            .update_product(second.id, kopi.id, &product("X", 1))
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete_product(second.id, kopi.id).await.unwrap());

        let updated = repo
            .update_product(first.id, kopi.id, &product("Kopi Bubuk 250g", 27_500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 27_500);
    }

    #[tokio::test]
    async fn test_delete_cascades_products() {
        let repo = SqlxUmkmRepository::new(migrated_pool().await);
        let business = repo.create(&umkm("Gula Aren", "kuliner", true), "gula-aren").await.unwrap();
        repo.create_product(business.id, &product("Gula Semut", 30_000)).await.unwrap();

        assert!(repo.delete(business.id).await.unwrap());
        assert_eq!(repo.count_products().await.unwrap(), 0);
    }
}
