use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Upstream anime id; the anime itself is not stored locally.
    pub anime_id: i32,

    pub user_id: i32,

    pub parent_id: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub rating: Option<i32>,

    /// One of `active`, `removed_by_author`, `removed_by_moderator`.
    pub status: String,

    pub edited: bool,

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
