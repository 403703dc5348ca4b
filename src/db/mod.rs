use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::posts;

pub mod migrator;
pub mod repositories;

pub use repositories::listing::{NewPost, PostPage, PostUpdate};
pub use repositories::user::{User, UserUpdate};

use crate::models::listing::Availability;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn listing_repo(&self) -> repositories::listing::ListingRepository {
        repositories::listing::ListingRepository::new(self.conn.clone())
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(name, email, password, security).await
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn user_exists(&self, id: &str) -> Result<bool> {
        self.user_repo().exists(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        changes: UserUpdate,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, changes, security).await
    }

    pub async fn remove_user(&self, id: &str) -> Result<bool> {
        self.user_repo().remove(id).await
    }

    pub async fn create_post(&self, new_post: NewPost) -> Result<posts::Model> {
        self.listing_repo().create(new_post).await
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<posts::Model>> {
        self.listing_repo().get(id).await
    }

    pub async fn get_post_owned(&self, id: &str, user_id: &str) -> Result<Option<posts::Model>> {
        self.listing_repo().get_owned(id, user_id).await
    }

    pub async fn page_posts(&self, page: u64, per_page: u64) -> Result<PostPage> {
        self.listing_repo().page(page, per_page).await
    }

    pub async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<posts::Model>> {
        self.listing_repo().list_by_user(user_id).await
    }

    pub async fn list_posts_by_category(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<posts::Model>> {
        self.listing_repo().list_by_category(category).await
    }

    pub async fn search_posts_by_title(&self, fragment: &str) -> Result<Vec<posts::Model>> {
        self.listing_repo().search_by_title(fragment).await
    }

    pub async fn update_post_fields(
        &self,
        post: posts::Model,
        changes: PostUpdate,
    ) -> Result<posts::Model> {
        self.listing_repo().update_fields(post, changes).await
    }

    pub async fn set_post_availability(
        &self,
        post: posts::Model,
        availability: Availability,
    ) -> Result<posts::Model> {
        self.listing_repo().set_availability(post, availability).await
    }

    pub async fn delete_post_owned(&self, id: &str, user_id: &str) -> Result<bool> {
        self.listing_repo().delete_owned(id, user_id).await
    }
}
