//! SeaORM implementation of FigureRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::domain::figure::{
    Figure, FigureImage, FigureSummary, ImageInput, MasterEntry, MasterKind, ReleasePrecision,
    UpdateFigureInput,
};
use crate::domain::{DomainError, FigureFilter, FigureRepository, PaginatedFigures};
use crate::models::figure::{self, ActiveModel, Column, Entity as FigureEntity};
use crate::models::{acquisition, figure_image, master_data};

use super::master_data_repository::{escape_like, find_entry};

const MAX_PAGE_SIZE: u64 = 100;

/// SeaORM-based implementation of FigureRepository
pub struct SeaOrmFigureRepository {
    db: DatabaseConnection,
}

impl SeaOrmFigureRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn encode_list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        serde_json::to_string(values).ok()
    }
}

fn decode_list(value: Option<&str>) -> Vec<String> {
    value
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

fn precision(value: &str) -> ReleasePrecision {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Unknown stored release precision '{}'", value);
        ReleasePrecision::Unknown
    })
}

fn thumbnail_url(images: &[FigureImage]) -> Option<String> {
    images
        .iter()
        .find(|img| img.is_thumbnail)
        .or_else(|| images.first())
        .map(|img| img.url.clone())
}

async fn images_by_figure<C: ConnectionTrait>(
    conn: &C,
    figure_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<FigureImage>>, DomainError> {
    let mut grouped: HashMap<i32, Vec<FigureImage>> = HashMap::new();
    if figure_ids.is_empty() {
        return Ok(grouped);
    }
    let images = figure_image::Entity::find()
        .filter(figure_image::Column::FigureId.is_in(figure_ids))
        .order_by_asc(figure_image::Column::SortOrder)
        .order_by_asc(figure_image::Column::Id)
        .all(conn)
        .await?;
    for image in images {
        grouped
            .entry(image.figure_id)
            .or_default()
            .push(FigureImage::from(image));
    }
    Ok(grouped)
}

/// Load the master rows and images of `models` and build the API view.
pub(crate) async fn assemble<C: ConnectionTrait>(
    conn: &C,
    models: Vec<figure::Model>,
) -> Result<Vec<Figure>, DomainError> {
    let master_ids: HashSet<i32> = models
        .iter()
        .flat_map(|m| {
            [
                m.manufacturer_id,
                m.series_id,
                m.character_id,
                m.category_id,
                m.scale_id,
            ]
        })
        .flatten()
        .collect();

    let mut masters: HashMap<i32, MasterEntry> = HashMap::new();
    if !master_ids.is_empty() {
        for row in master_data::Entity::find()
            .filter(master_data::Column::Id.is_in(master_ids))
            .all(conn)
            .await?
        {
            if let Ok(kind) = row.kind.parse::<MasterKind>() {
                masters.insert(
                    row.id,
                    MasterEntry {
                        id: row.id,
                        kind,
                        name: row.name,
                        parent_id: row.parent_id,
                    },
                );
            }
        }
    }

    let mut images = images_by_figure(conn, models.iter().map(|m| m.id).collect()).await?;
    let lookup = |id: Option<i32>| id.and_then(|id| masters.get(&id).cloned());

    Ok(models
        .into_iter()
        .map(|m| {
            let images = images.remove(&m.id).unwrap_or_default();
            Figure {
                id: m.id,
                manufacturer: lookup(m.manufacturer_id),
                series: lookup(m.series_id),
                character: lookup(m.character_id),
                category: lookup(m.category_id),
                scale: lookup(m.scale_id),
                sculptors: decode_list(m.sculptors.as_deref()),
                paint_work: decode_list(m.paint_work.as_deref()),
                release_precision: precision(&m.release_precision),
                thumbnail_url: thumbnail_url(&images),
                images,
                name: m.name,
                name_en: m.name_en,
                name_ja: m.name_ja,
                size: m.size,
                material: m.material,
                release_date: m.release_date,
                price_krw: m.price_krw,
                price_jpy: m.price_jpy,
                price_usd: m.price_usd,
                description: m.description,
                specification: m.specification,
                is_limited: m.is_limited,
                is_adult: m.is_adult,
                created_at: m.created_at,
                updated_at: m.updated_at,
            }
        })
        .collect())
}

/// Summaries keyed by figure id, for acquisition listings.
pub(crate) async fn summaries<C: ConnectionTrait>(
    conn: &C,
    figure_ids: Vec<i32>,
) -> Result<HashMap<i32, FigureSummary>, DomainError> {
    if figure_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let models = FigureEntity::find()
        .filter(Column::Id.is_in(figure_ids.clone()))
        .all(conn)
        .await?;
    let mut images = images_by_figure(conn, figure_ids).await?;

    Ok(models
        .into_iter()
        .map(|m| {
            let images = images.remove(&m.id).unwrap_or_default();
            (
                m.id,
                FigureSummary {
                    id: m.id,
                    thumbnail_url: thumbnail_url(&images),
                    release_precision: precision(&m.release_precision),
                    name: m.name,
                    release_date: m.release_date,
                },
            )
        })
        .collect())
}

async fn require_master<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    id: i32,
) -> Result<i32, DomainError> {
    match find_entry(conn, kind, id).await? {
        Some(entry) => Ok(entry.id),
        None => Err(DomainError::Validation(format!("Unknown {} id {}", kind, id))),
    }
}

async fn load_images<C: ConnectionTrait>(
    conn: &C,
    figure_id: i32,
) -> Result<Vec<FigureImage>, DomainError> {
    Ok(figure_image::Entity::find()
        .filter(figure_image::Column::FigureId.eq(figure_id))
        .order_by_asc(figure_image::Column::SortOrder)
        .order_by_asc(figure_image::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(FigureImage::from)
        .collect())
}

impl SeaOrmFigureRepository {
    async fn require_figure(&self, id: i32) -> Result<figure::Model, DomainError> {
        FigureEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

#[async_trait]
impl FigureRepository for SeaOrmFigureRepository {
    async fn find_all(&self, filter: FigureFilter) -> Result<PaginatedFigures, DomainError> {
        let mut query = FigureEntity::find();

        if let Some(q) = &filter.q
            && !q.trim().is_empty()
        {
            let pattern = format!("%{}%", escape_like(q.trim()));
            let like = || LikeExpr::new(pattern.clone()).escape('\\');
            let cond = Condition::any()
                .add(Expr::col((FigureEntity, Column::Name)).like(like()))
                .add(Expr::col((FigureEntity, Column::NameEn)).like(like()))
                .add(Expr::col((FigureEntity, Column::NameJa)).like(like()));
            query = query.filter(cond);
        }

        if let Some(series_id) = filter.series_id {
            query = query.filter(Column::SeriesId.eq(series_id));
        }
        if let Some(manufacturer_id) = filter.manufacturer_id {
            query = query.filter(Column::ManufacturerId.eq(manufacturer_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(Column::CategoryId.eq(category_id));
        }

        query = query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let (models, total) = if let Some(limit) = filter.limit {
            let page = filter.page.unwrap_or(0);
            let paginator = query.paginate(&self.db, limit.clamp(1, MAX_PAGE_SIZE));
            let total = paginator.num_items().await?;
            let items = paginator.fetch_page(page).await?;
            (items, total)
        } else {
            let items = query.all(&self.db).await?;
            let total = items.len() as u64;
            (items, total)
        };

        Ok(PaginatedFigures {
            figures: assemble(&self.db, models).await?,
            total,
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Figure>, DomainError> {
        match FigureEntity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(assemble(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i32, input: UpdateFigureInput) -> Result<Figure, DomainError> {
        input.validate()?;
        let model = self.require_figure(id).await?;
        let mut active: ActiveModel = model.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(name_en) = input.name_en {
            active.name_en = Set(name_en);
        }
        if let Some(name_ja) = input.name_ja {
            active.name_ja = Set(name_ja);
        }
        if let Some(mid) = input.manufacturer_id {
            active.manufacturer_id =
                Set(Some(require_master(&self.db, MasterKind::Manufacturer, mid).await?));
        }
        if let Some(sid) = input.series_id {
            active.series_id = Set(Some(require_master(&self.db, MasterKind::Series, sid).await?));
        }
        if let Some(cid) = input.character_id {
            active.character_id =
                Set(Some(require_master(&self.db, MasterKind::Character, cid).await?));
        }
        if let Some(cid) = input.category_id {
            active.category_id =
                Set(Some(require_master(&self.db, MasterKind::Category, cid).await?));
        }
        if let Some(scale_id) = input.scale_id {
            active.scale_id = Set(match scale_id {
                Some(sid) => Some(require_master(&self.db, MasterKind::Scale, sid).await?),
                None => None,
            });
        }
        if let Some(size) = input.size {
            active.size = Set(size);
        }
        if let Some(material) = input.material {
            active.material = Set(material);
        }
        if let Some(sculptors) = input.sculptors {
            active.sculptors = Set(encode_list(&sculptors));
        }
        if let Some(paint_work) = input.paint_work {
            active.paint_work = Set(encode_list(&paint_work));
        }
        if let Some(release_date) = input.release_date {
            active.release_date = Set(release_date);
        }
        if let Some(release_precision) = input.release_precision {
            active.release_precision = Set(release_precision.as_str().to_string());
        }
        if let Some(price) = input.price_krw {
            active.price_krw = Set(price);
        }
        if let Some(price) = input.price_jpy {
            active.price_jpy = Set(price);
        }
        if let Some(price) = input.price_usd {
            active.price_usd = Set(price);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(specification) = input.specification {
            active.specification = Set(specification);
        }
        if let Some(is_limited) = input.is_limited {
            active.is_limited = Set(is_limited);
        }
        if let Some(is_adult) = input.is_adult {
            active.is_adult = Set(is_adult);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.db).await?;
        assemble(&self.db, vec![updated])
            .await?
            .pop()
            .ok_or(DomainError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        self.require_figure(id).await?;

        let tracked = acquisition::Entity::find()
            .filter(acquisition::Column::FigureId.eq(id))
            .count(&self.db)
            .await?;
        if tracked > 0 {
            return Err(DomainError::Validation(format!(
                "Figure is tracked by {} acquisition(s)",
                tracked
            )));
        }

        let txn = self.db.begin().await?;
        figure_image::Entity::delete_many()
            .filter(figure_image::Column::FigureId.eq(id))
            .exec(&txn)
            .await?;
        FigureEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Deleted figure {}", id);
        Ok(())
    }

    async fn list_images(&self, figure_id: i32) -> Result<Vec<FigureImage>, DomainError> {
        self.require_figure(figure_id).await?;
        load_images(&self.db, figure_id).await
    }

    async fn add_image(
        &self,
        figure_id: i32,
        input: ImageInput,
    ) -> Result<FigureImage, DomainError> {
        if input.url.trim().is_empty() {
            return Err(DomainError::Validation("image url is required".to_string()));
        }
        self.require_figure(figure_id).await?;

        let existing = load_images(&self.db, figure_id).await?;
        let sort_order = existing.iter().map(|img| img.sort_order + 1).max().unwrap_or(0);
        let is_thumbnail = input.is_thumbnail || existing.is_empty();

        let txn = self.db.begin().await?;
        if is_thumbnail {
            figure_image::Entity::update_many()
                .col_expr(figure_image::Column::IsThumbnail, Expr::value(false))
                .filter(figure_image::Column::FigureId.eq(figure_id))
                .exec(&txn)
                .await?;
        }
        let model = figure_image::ActiveModel {
            figure_id: Set(figure_id),
            url: Set(input.url.trim().to_string()),
            is_thumbnail: Set(is_thumbnail),
            sort_order: Set(sort_order),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(FigureImage::from(model))
    }

    async fn set_thumbnail(
        &self,
        figure_id: i32,
        image_id: i32,
    ) -> Result<Vec<FigureImage>, DomainError> {
        let images = self.list_images(figure_id).await?;
        if !images.iter().any(|img| img.id == image_id) {
            return Err(DomainError::NotFound);
        }

        let txn = self.db.begin().await?;
        figure_image::Entity::update_many()
            .col_expr(figure_image::Column::IsThumbnail, Expr::value(false))
            .filter(figure_image::Column::FigureId.eq(figure_id))
            .exec(&txn)
            .await?;
        figure_image::Entity::update_many()
            .col_expr(figure_image::Column::IsThumbnail, Expr::value(true))
            .filter(figure_image::Column::Id.eq(image_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        load_images(&self.db, figure_id).await
    }

    async fn reorder_images(
        &self,
        figure_id: i32,
        image_ids: Vec<i32>,
    ) -> Result<Vec<FigureImage>, DomainError> {
        let images = self.list_images(figure_id).await?;

        let current: HashSet<i32> = images.iter().map(|img| img.id).collect();
        let requested: HashSet<i32> = image_ids.iter().copied().collect();
        if requested.len() != image_ids.len() || requested != current {
            return Err(DomainError::Validation(
                "image_ids must list every image of the figure exactly once".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        for (index, image_id) in image_ids.iter().enumerate() {
            figure_image::Entity::update_many()
                .col_expr(figure_image::Column::SortOrder, Expr::value(index as i32))
                .filter(figure_image::Column::Id.eq(*image_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        load_images(&self.db, figure_id).await
    }

    async fn delete_image(&self, figure_id: i32, image_id: i32) -> Result<(), DomainError> {
        let images = self.list_images(figure_id).await?;
        let Some(image) = images.iter().find(|img| img.id == image_id) else {
            return Err(DomainError::NotFound);
        };

        let txn = self.db.begin().await?;
        figure_image::Entity::delete_by_id(image_id).exec(&txn).await?;

        // Promote the next image so the figure keeps a thumbnail
        if image.is_thumbnail
            && let Some(next) = images.iter().find(|img| img.id != image_id)
        {
            figure_image::Entity::update_many()
                .col_expr(figure_image::Column::IsThumbnail, Expr::value(true))
                .filter(figure_image::Column::Id.eq(next.id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}
