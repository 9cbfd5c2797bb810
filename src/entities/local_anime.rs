use sea_orm::entity::prelude::*;

/// Snapshot of a catalog record taken by the `import` command.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "local_anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub synopsis: String,
    pub image_url: String,
    pub score: Option<f64>,
    pub episodes: Option<i32>,
    pub kind: Option<String>,
    pub status: String,
    /// Comma separated, lowercase.
    pub genres: String,
    pub imported_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
