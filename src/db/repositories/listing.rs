use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::posts;
use crate::models::listing::Availability;

/// Fields required to create a post. Availability always starts `available`.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: String,
    pub instrument_type: String,
    pub brand: String,
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub phone_number: String,
    pub image: Option<String>,
    pub status: String,
    pub location: String,
}

/// Fields a post update may change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub instrument_type: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
}

/// A page of posts together with the paginator's totals.
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<posts::Model>,
    pub total: u64,
    pub pages: u64,
}

pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new_post: NewPost) -> Result<posts::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let post = posts::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(new_post.user_id),
            instrument_type: Set(new_post.instrument_type),
            brand: Set(new_post.brand),
            title: Set(new_post.title),
            price: Set(new_post.price),
            description: Set(new_post.description),
            phone_number: Set(new_post.phone_number),
            image: Set(new_post.image),
            availability: Set(Availability::Available.as_str().to_string()),
            status: Set(new_post.status),
            location: Set(new_post.location),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = post
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;

        info!("Created post {} by user {}", model.id, model.user_id);
        Ok(model)
    }

    pub async fn get(&self, id: &str) -> Result<Option<posts::Model>> {
        posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post by ID")
    }

    /// Lookup scoped to the owner; other users' posts come back as `None`.
    pub async fn get_owned(&self, id: &str, user_id: &str) -> Result<Option<posts::Model>> {
        posts::Entity::find()
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query post by ID and owner")
    }

    /// One page of all posts, newest first. Pages are 1-based; a page past
    /// the end yields an empty list rather than an error.
    pub async fn page(&self, page: u64, per_page: u64) -> Result<PostPage> {
        let paginator = posts::Entity::find()
            .order_by_desc(posts::Column::CreatedAt)
            .paginate(&self.conn, per_page);

        let counts = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count posts")?;
        let posts = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .context("Failed to fetch post page")?;

        Ok(PostPage {
            posts,
            total: counts.number_of_items,
            pages: counts.number_of_pages,
        })
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<posts::Model>> {
        posts::Entity::find()
            .filter(posts::Column::UserId.eq(user_id))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query posts by user")
    }

    /// Posts filtered by instrument category; `None` returns everything.
    pub async fn list_by_category(&self, category: Option<&str>) -> Result<Vec<posts::Model>> {
        let mut query = posts::Entity::find().order_by_desc(posts::Column::CreatedAt);

        if let Some(category) = category {
            query = query.filter(posts::Column::InstrumentType.eq(category));
        }

        query.all(&self.conn).await.context("Failed to query posts by category")
    }

    /// Case-insensitive substring match on the title.
    pub async fn search_by_title(&self, fragment: &str) -> Result<Vec<posts::Model>> {
        posts::Entity::find()
            .filter(posts::Column::Title.contains(fragment))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to search posts by title")
    }

    pub async fn update_fields(
        &self,
        post: posts::Model,
        changes: PostUpdate,
    ) -> Result<posts::Model> {
        let mut active: posts::ActiveModel = post.into();

        if let Some(instrument_type) = changes.instrument_type {
            active.instrument_type = Set(instrument_type);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(brand) = changes.brand {
            active.brand = Set(brand);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(phone_number) = changes.phone_number {
            active.phone_number = Set(phone_number);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(image) = changes.image {
            active.image = Set(Some(image));
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active.update(&self.conn).await.context("Failed to update post")
    }

    pub async fn set_availability(
        &self,
        post: posts::Model,
        availability: Availability,
    ) -> Result<posts::Model> {
        let mut active: posts::ActiveModel = post.into();
        active.availability = Set(availability.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update post availability")
    }

    /// Delete a post only if the caller owns it; reports whether a row went.
    pub async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = posts::Entity::delete_many()
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Deleted post {}", id);
        }
        Ok(removed)
    }
}
