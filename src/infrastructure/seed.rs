use crate::infrastructure::auth::{ROLE_ADMIN, ROLE_USER, hash_password};
use crate::domain::figure::MasterKind;
use crate::models::{master_data, user};
use sea_orm::*;

async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<(), DbErr> {
    let password_hash = hash_password(password).map_err(DbErr::Custom)?;
    let now = chrono::Utc::now().to_rfc3339();

    let model = user::ActiveModel {
        username: Set(username.to_owned()),
        password_hash: Set(password_hash),
        role: Set(role.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    user::Entity::insert(model)
        .on_conflict(
            sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
    Ok(())
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Users
    seed_user(db, "admin", "admin", ROLE_ADMIN).await?;
    seed_user(db, "user", "user", ROLE_USER).await?;

    // 2. Lookup rows every catalog needs
    let rows = [
        (MasterKind::Category, "Scale Figure"),
        (MasterKind::Category, "Nendoroid"),
        (MasterKind::Category, "Figma"),
        (MasterKind::Category, "Prize Figure"),
        (MasterKind::Scale, "1/4"),
        (MasterKind::Scale, "1/6"),
        (MasterKind::Scale, "1/7"),
        (MasterKind::Scale, "1/8"),
        (MasterKind::Shop, "AmiAmi"),
        (MasterKind::Shop, "Hobby Search"),
        (MasterKind::Shop, "Good Smile Online Shop"),
    ];

    for (kind, name) in rows {
        let exists = master_data::Entity::find()
            .filter(master_data::Column::Kind.eq(kind.as_str()))
            .filter(master_data::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = chrono::Utc::now().to_rfc3339();
        master_data::ActiveModel {
            kind: Set(kind.as_str().to_owned()),
            name: Set(name.to_owned()),
            parent_id: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = db::init_db("sqlite::memory:").await.unwrap();
        seed_demo_data(&db).await.unwrap();
        seed_demo_data(&db).await.unwrap();

        let users = user::Entity::find().count(&db).await.unwrap();
        assert_eq!(users, 2);

        let shops = master_data::Entity::find()
            .filter(master_data::Column::Kind.eq("shop"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(shops, 3);
    }
}
