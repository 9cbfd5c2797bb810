use crate::entities::prelude::*;
use crate::entities::{profiles, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seeded admin API key, meant to be regenerated after first login.
const DEFAULT_API_KEY: &str = "animecalendar_default_api_key_please_regenerate";

fn hash_default_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"password", &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Profiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed a staff account so a fresh install can moderate right away
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password()?;

        let insert_user = Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Username,
                users::Column::PasswordHash,
                users::Column::ApiKey,
                users::Column::IsStaff,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                password_hash.into(),
                DEFAULT_API_KEY.into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_user).await?;

        let insert_profile = Query::insert()
            .into_table(Profiles)
            .columns([
                profiles::Column::UserId,
                profiles::Column::AvatarChoice,
                profiles::Column::IsVip,
                profiles::Column::Bio,
                profiles::Column::CreatedAt,
                profiles::Column::UpdatedAt,
            ])
            .select_from(
                Query::select()
                    .column(users::Column::Id)
                    .expr(Expr::val(crate::constants::profiles::DEFAULT_AVATAR))
                    .expr(Expr::val(false))
                    .expr(Expr::val(""))
                    .expr(Expr::val(now.clone()))
                    .expr(Expr::val(now))
                    .from(Users)
                    .and_where(Expr::col(users::Column::Username).eq("admin"))
                    .to_owned(),
            )
            .map_err(|e| DbErr::Custom(format!("Failed to build profile seed: {e}")))?
            .to_owned();
        manager.exec_stmt(insert_profile).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
