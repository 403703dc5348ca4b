use serde::{Deserialize, Serialize};

use crate::db::repositories::user::User;
use crate::entities::posts;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: String,
    pub user_id: String,
    pub instrument_type: String,
    pub brand: String,
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub phone_number: String,
    pub image: Option<String>,
    pub availability: String,
    pub status: String,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<posts::Model> for PostDto {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            instrument_type: model.instrument_type,
            brand: model.brand,
            title: model.title,
            price: model.price,
            description: model.description,
            phone_number: model.phone_number,
            image: model.image,
            availability: model.availability,
            status: model.status,
            location: model.location,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Public view of a user; the password hash never leaves the repository.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationDto {
    pub total: u64,
    pub pages: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostPageDto {
    pub posts: Vec<PostDto>,
    pub pagination: PaginationDto,
}

/// Incoming listing payload, shared by create and update. Every field is
/// optional at the wire level; the validator decides what is required.
#[derive(Debug, Default, Deserialize)]
pub struct PostPayload {
    pub instrument_type: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<serde_json::Value>,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredDto {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginDto {
    pub access_token: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedPostDto {
    pub message: String,
    pub post_id: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedPostDto {
    pub message: String,
    pub post: PostDto,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUserDto {
    pub message: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct UploadDto {
    pub filename: String,
}
