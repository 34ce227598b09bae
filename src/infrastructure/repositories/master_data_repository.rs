//! SeaORM implementation of MasterDataRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::figure::{MasterEntry, MasterKind, MasterRef};
use crate::domain::{DomainError, MasterDataRepository, MasterFilter};
use crate::models::master_data::{self, ActiveModel, Column, Entity as MasterEntity};

const DEFAULT_SEARCH_LIMIT: u64 = 20;
const MAX_SEARCH_LIMIT: u64 = 100;

/// SeaORM-based implementation of MasterDataRepository
pub struct SeaOrmMasterDataRepository {
    db: DatabaseConnection,
}

impl SeaOrmMasterDataRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards so `value` matches literally under `ESCAPE '\\'`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_entry(model: master_data::Model) -> Result<MasterEntry, DomainError> {
    let kind = model
        .kind
        .parse::<MasterKind>()
        .map_err(|_| DomainError::Internal(format!("Stored master kind '{}'", model.kind)))?;
    Ok(MasterEntry {
        id: model.id,
        kind,
        name: model.name,
        parent_id: model.parent_id,
    })
}

fn parent_condition(parent_id: Option<i32>) -> Condition {
    match parent_id {
        Some(id) => Condition::all().add(Column::ParentId.eq(id)),
        None => Condition::all().add(Column::ParentId.is_null()),
    }
}

pub(crate) async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    id: i32,
) -> Result<Option<MasterEntry>, DomainError> {
    MasterEntity::find_by_id(id)
        .filter(Column::Kind.eq(kind.as_str()))
        .one(conn)
        .await?
        .map(to_entry)
        .transpose()
}

async fn find_by_name<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    name: &str,
    parent_id: Option<i32>,
) -> Result<Option<master_data::Model>, DomainError> {
    Ok(MasterEntity::find()
        .filter(Column::Kind.eq(kind.as_str()))
        .filter(Column::Name.eq(name))
        .filter(parent_condition(parent_id))
        .one(conn)
        .await?)
}

/// Parent ids are only accepted on kinds that have a parent kind, and must
/// point at an existing row of that kind.
async fn check_parent<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    parent_id: Option<i32>,
) -> Result<(), DomainError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let Some(parent_kind) = kind.parent_kind() else {
        return Err(DomainError::Validation(format!(
            "{} entries have no parent",
            kind
        )));
    };
    if find_entry(conn, parent_kind, parent_id).await?.is_none() {
        return Err(DomainError::Validation(format!(
            "Unknown {} id {}",
            parent_kind, parent_id
        )));
    }
    Ok(())
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    name: &str,
    parent_id: Option<i32>,
) -> Result<master_data::Model, DomainError> {
    let now = chrono::Utc::now().to_rfc3339();
    let model = ActiveModel {
        kind: Set(kind.as_str().to_string()),
        name: Set(name.to_string()),
        parent_id: Set(parent_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

/// Resolve a reference to a row id, creating the row when it is given by a
/// name that does not exist yet. Runs on whatever connection it is handed so
/// registration can call it inside its transaction.
pub(crate) async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    kind: MasterKind,
    reference: &MasterRef,
    parent_id: Option<i32>,
) -> Result<i32, DomainError> {
    match reference {
        MasterRef::Id(id) => match find_entry(conn, kind, *id).await? {
            Some(entry) => Ok(entry.id),
            None => Err(DomainError::Validation(format!("Unknown {} id {}", kind, id))),
        },
        MasterRef::Name(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::Validation(format!("{} name is required", kind)));
            }
            if let Some(existing) = find_by_name(conn, kind, name, parent_id).await? {
                return Ok(existing.id);
            }
            let created = insert(conn, kind, name, parent_id).await?;
            tracing::info!("Created {} '{}' (id {})", kind, created.name, created.id);
            Ok(created.id)
        }
    }
}

#[async_trait]
impl MasterDataRepository for SeaOrmMasterDataRepository {
    async fn search(
        &self,
        kind: MasterKind,
        filter: MasterFilter,
    ) -> Result<Vec<MasterEntry>, DomainError> {
        let mut query = MasterEntity::find().filter(Column::Kind.eq(kind.as_str()));

        if let Some(q) = &filter.q
            && !q.trim().is_empty()
        {
            let pattern = format!("{}%", escape_like(q.trim()));
            query = query.filter(Expr::col((MasterEntity, Column::Name)).like(LikeExpr::new(pattern).escape('\\')));
        }

        if let Some(parent_id) = filter.parent_id {
            query = query.filter(Column::ParentId.eq(parent_id));
        }

        let limit = filter
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        query
            .order_by_asc(Column::Name)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_entry)
            .collect()
    }

    async fn find_by_id(
        &self,
        kind: MasterKind,
        id: i32,
    ) -> Result<Option<MasterEntry>, DomainError> {
        find_entry(&self.db, kind, id).await
    }

    async fn create(
        &self,
        kind: MasterKind,
        name: String,
        parent_id: Option<i32>,
    ) -> Result<MasterEntry, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(format!("{} name is required", kind)));
        }
        check_parent(&self.db, kind, parent_id).await?;

        if find_by_name(&self.db, kind, name, parent_id).await?.is_some() {
            return Err(DomainError::Validation(format!(
                "{} '{}' already exists",
                kind, name
            )));
        }

        to_entry(insert(&self.db, kind, name, parent_id).await?)
    }

    async fn rename(
        &self,
        kind: MasterKind,
        id: i32,
        name: String,
    ) -> Result<MasterEntry, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(format!("{} name is required", kind)));
        }

        let model = MasterEntity::find_by_id(id)
            .filter(Column::Kind.eq(kind.as_str()))
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        if let Some(existing) = find_by_name(&self.db, kind, name, model.parent_id).await?
            && existing.id != id
        {
            return Err(DomainError::Validation(format!(
                "{} '{}' already exists",
                kind, name
            )));
        }

        let mut active: ActiveModel = model.into();
        active.name = Set(name.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        to_entry(active.update(&self.db).await?)
    }
}
