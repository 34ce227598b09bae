use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};

use crate::domain::DomainError;
use crate::domain::figure::{Figure, MasterKind, RegisterFigureInput};
use crate::infrastructure::repositories::figure_repository::{assemble, encode_list};
use crate::infrastructure::repositories::master_data_repository::find_or_create;
use crate::models::{figure, figure_image};

/// Register a figure together with any master data it names and its images.
///
/// Everything happens in one transaction: a failure anywhere leaves no
/// figure, no image and no newly created master row behind.
pub async fn register_figure(
    db: &DatabaseConnection,
    input: RegisterFigureInput,
    created_by: Option<i32>,
) -> Result<Figure, DomainError> {
    input.validate()?;
    let images = input.normalized_images();

    let txn = db.begin().await?;

    let manufacturer_id =
        find_or_create(&txn, MasterKind::Manufacturer, &input.manufacturer, None).await?;
    let series_id = find_or_create(&txn, MasterKind::Series, &input.series, None).await?;
    let character_id =
        find_or_create(&txn, MasterKind::Character, &input.character, Some(series_id)).await?;
    let category_id = find_or_create(&txn, MasterKind::Category, &input.category, None).await?;
    let scale_id = match &input.scale {
        Some(scale) => Some(find_or_create(&txn, MasterKind::Scale, scale, None).await?),
        None => None,
    };

    let now = chrono::Utc::now().to_rfc3339();
    let model = figure::ActiveModel {
        name: Set(input.name.trim().to_string()),
        name_en: Set(input.name_en),
        name_ja: Set(input.name_ja),
        manufacturer_id: Set(Some(manufacturer_id)),
        series_id: Set(Some(series_id)),
        character_id: Set(Some(character_id)),
        category_id: Set(Some(category_id)),
        scale_id: Set(scale_id),
        size: Set(input.size),
        material: Set(input.material),
        sculptors: Set(encode_list(&input.sculptors)),
        paint_work: Set(encode_list(&input.paint_work)),
        release_date: Set(input.release_date),
        release_precision: Set(input.release_precision.as_str().to_string()),
        price_krw: Set(input.price_krw),
        price_jpy: Set(input.price_jpy),
        price_usd: Set(input.price_usd),
        description: Set(input.description),
        specification: Set(input.specification),
        is_limited: Set(input.is_limited),
        is_adult: Set(input.is_adult),
        created_by: Set(created_by),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (index, image) in images.into_iter().enumerate() {
        figure_image::ActiveModel {
            figure_id: Set(model.id),
            url: Set(image.url.trim().to_string()),
            is_thumbnail: Set(image.is_thumbnail),
            sort_order: Set(index as i32),
            created_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let figure = assemble(&txn, vec![model])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal("registered figure vanished".to_string()))?;

    txn.commit().await?;

    tracing::info!("Registered figure {} '{}'", figure.id, figure.name);
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::figure::{ImageInput, MasterRef};
    use crate::infrastructure::db;
    use crate::models::master_data;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn input() -> RegisterFigureInput {
        serde_json::from_value(serde_json::json!({
            "name": "Rem 1/7",
            "manufacturer": "Good Smile Company",
            "series": "Re:Zero",
            "character": "Rem",
            "category": "Scale Figure",
            "scale": "1/7",
            "sculptors": ["Kagen"],
            "release_date": "2024-08-31",
            "release_precision": "month",
            "price_jpy": 22000,
            "images": [
                {"url": "http://localhost:8000/storage/figures/a.png"},
                {"url": "http://localhost:8000/storage/figures/b.png", "is_thumbnail": true}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_master_rows_and_images() {
        let db = db::init_db("sqlite::memory:").await.unwrap();

        let figure = register_figure(&db, input(), None).await.unwrap();

        assert_eq!(figure.name, "Rem 1/7");
        assert_eq!(figure.sculptors, vec!["Kagen".to_string()]);
        let series = figure.series.clone().unwrap();
        let character = figure.character.clone().unwrap();
        assert_eq!(character.parent_id, Some(series.id));
        assert_eq!(figure.scale.as_ref().unwrap().name, "1/7");

        let orders: Vec<i32> = figure.images.iter().map(|img| img.sort_order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(
            figure.thumbnail_url.as_deref(),
            Some("http://localhost:8000/storage/figures/b.png")
        );

        // A second figure reuses the rows by name
        let mut again = input();
        again.name = "Rem 1/7 Repaint".to_string();
        again.images.clear();
        let second = register_figure(&db, again, None).await.unwrap();
        assert_eq!(second.series.unwrap().id, series.id);
        assert!(second.thumbnail_url.is_none());

        let rows = master_data::Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 5);
    }

    #[tokio::test]
    async fn test_failed_registration_leaves_nothing_behind() {
        let db = db::init_db("sqlite::memory:").await.unwrap();

        let mut bad = input();
        bad.category = MasterRef::Id(4242);
        bad.images = vec![ImageInput {
            url: "x".to_string(),
            is_thumbnail: false,
        }];
        assert!(matches!(
            register_figure(&db, bad, None).await,
            Err(DomainError::Validation(_))
        ));

        assert_eq!(master_data::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(figure::Entity::find().count(&db).await.unwrap(), 0);
    }
}
