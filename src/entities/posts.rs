use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    /// UUID v4, assigned at creation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Instrument category, stored as its canonical label
    pub instrument_type: String,

    pub brand: String,

    pub title: String,

    pub price: f64,

    pub description: Option<String>,

    pub phone_number: String,

    pub image: Option<String>,

    /// `available`, `rented` or `sold`
    pub availability: String,

    /// `for rental` or `for sale`, fixed at creation
    pub status: String,

    pub location: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
