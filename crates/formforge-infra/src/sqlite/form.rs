//! SQLite form schema repository.
//!
//! Implements `FormRepository` from `formforge-core`. Fields and handlers are
//! stored as a `*_type` discriminator column plus a `config` JSON document
//! holding the subtype-specific attributes. On read the discriminator is
//! resolved first; a tag that no longer names a registered subtype is an
//! integrity error, never silently dropped.

use formforge_core::repository::SortOrder;
use formforge_core::repository::form::{FormFilter, FormRepository};
use formforge_types::error::RepositoryError;
use formforge_types::field::{FieldDef, FieldId, FieldKind, FieldType, Widget};
use formforge_types::form::{Form, FormId, FormSchema};
use formforge_types::handler::{HandlerDef, HandlerId, HandlerKind, HandlerType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `FormRepository`.
#[derive(Clone)]
pub struct SqliteFormRepository {
    pool: DatabasePool,
}

impl SqliteFormRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

struct FormRow {
    id: String,
    title: String,
    target_model: Option<String>,
    created_at: String,
    updated_at: String,
}

impl FormRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            target_model: row.try_get("target_model")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_form(self) -> Result<Form, RepositoryError> {
        Ok(Form {
            id: self
                .id
                .parse::<FormId>()
                .map_err(|e| RepositoryError::Query(format!("invalid form id: {e}")))?,
            title: self.title,
            target_model: self.target_model,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct FieldRow {
    id: String,
    form_id: String,
    name: String,
    label: String,
    help_text: String,
    required: bool,
    widget: String,
    position: i32,
    field_type: String,
    config: String,
    created_at: String,
}

impl FieldRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            form_id: row.try_get("form_id")?,
            name: row.try_get("name")?,
            label: row.try_get("label")?,
            help_text: row.try_get("help_text")?,
            required: row.try_get("required")?,
            widget: row.try_get("widget")?,
            position: row.try_get("position")?,
            field_type: row.try_get("field_type")?,
            config: row.try_get("config")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_field(self) -> Result<FieldDef, RepositoryError> {
        let field_type: FieldType = self.field_type.parse().map_err(|_| {
            RepositoryError::Integrity(format!(
                "field '{}' has unregistered field discriminator '{}'",
                self.name, self.field_type
            ))
        })?;
        let kind: FieldKind = decode_config(field_type.as_str(), &self.config)?;
        let widget: Widget = self
            .widget
            .parse()
            .map_err(|e: String| RepositoryError::Integrity(e))?;

        Ok(FieldDef {
            id: self
                .id
                .parse::<FieldId>()
                .map_err(|e| RepositoryError::Query(format!("invalid field id: {e}")))?,
            form_id: self
                .form_id
                .parse::<FormId>()
                .map_err(|e| RepositoryError::Query(format!("invalid form id: {e}")))?,
            name: self.name,
            label: self.label,
            help_text: self.help_text,
            required: self.required,
            widget,
            order: self.position,
            kind,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct HandlerRow {
    id: String,
    form_id: String,
    name: String,
    position: i32,
    handler_type: String,
    config: String,
    created_at: String,
}

impl HandlerRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            form_id: row.try_get("form_id")?,
            name: row.try_get("name")?,
            position: row.try_get("position")?,
            handler_type: row.try_get("handler_type")?,
            config: row.try_get("config")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_handler(self) -> Result<HandlerDef, RepositoryError> {
        let handler_type: HandlerType = self.handler_type.parse().map_err(|_| {
            RepositoryError::Integrity(format!(
                "handler '{}' has unregistered handler discriminator '{}'",
                self.name, self.handler_type
            ))
        })?;
        let kind: HandlerKind = decode_config(handler_type.as_str(), &self.config)?;

        Ok(HandlerDef {
            id: self
                .id
                .parse::<HandlerId>()
                .map_err(|e| RepositoryError::Query(format!("invalid handler id: {e}")))?,
            form_id: self
                .form_id
                .parse::<FormId>()
                .map_err(|e| RepositoryError::Query(format!("invalid form id: {e}")))?,
            name: self.name,
            order: self.position,
            kind,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Serialize a tagged kind to its `config` column, dropping the `type` tag
/// (it lives in the discriminator column).
fn encode_config<T: Serialize>(kind: &T) -> Result<String, RepositoryError> {
    let mut value =
        serde_json::to_value(kind).map_err(|e| RepositoryError::Query(e.to_string()))?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("type");
    }
    Ok(value.to_string())
}

/// Rebuild a tagged kind from the discriminator column and `config` JSON.
fn decode_config<T: DeserializeOwned>(tag: &str, config: &str) -> Result<T, RepositoryError> {
    let mut value: serde_json::Value = serde_json::from_str(config)
        .map_err(|e| RepositoryError::Integrity(format!("invalid {tag} config JSON: {e}")))?;
    let obj = value.as_object_mut().ok_or_else(|| {
        RepositoryError::Integrity(format!("{tag} config is not a JSON object"))
    })?;
    obj.insert("type".to_string(), serde_json::Value::String(tag.to_string()));
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Integrity(format!("invalid {tag} config: {e}")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

// ---------------------------------------------------------------------------
// Statements shared by single-row writes and `insert_schema`
// ---------------------------------------------------------------------------

async fn insert_form_row(conn: &mut SqliteConnection, form: &Form) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO forms (id, title, target_model, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(form.id.to_string())
    .bind(&form.title)
    .bind(&form.target_model)
    .bind(format_datetime(&form.created_at))
    .bind(format_datetime(&form.updated_at))
    .execute(conn)
    .await
    .map_err(query_error)?;
    Ok(())
}

async fn insert_field_row(
    conn: &mut SqliteConnection,
    field: &FieldDef,
) -> Result<(), RepositoryError> {
    let config = encode_config(&field.kind)?;

    let result = sqlx::query(
        "INSERT INTO form_fields (id, form_id, name, label, help_text, required, widget, position, seq, field_type, config, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM form_fields), ?, ?, ?)",
    )
    .bind(field.id.to_string())
    .bind(field.form_id.to_string())
    .bind(&field.name)
    .bind(&field.label)
    .bind(&field.help_text)
    .bind(field.required)
    .bind(field.widget.as_str())
    .bind(field.order)
    .bind(field.field_type().as_str())
    .bind(&config)
    .bind(format_datetime(&field.created_at))
    .execute(conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(field.name.clone())),
        Err(e) => Err(query_error(e)),
    }
}

async fn insert_handler_row(
    conn: &mut SqliteConnection,
    handler: &HandlerDef,
) -> Result<(), RepositoryError> {
    let config = encode_config(&handler.kind)?;

    sqlx::query(
        "INSERT INTO form_handlers (id, form_id, name, position, seq, handler_type, config, created_at)
         VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM form_handlers), ?, ?, ?)",
    )
    .bind(handler.id.to_string())
    .bind(handler.form_id.to_string())
    .bind(&handler.name)
    .bind(handler.order)
    .bind(handler.handler_type().as_str())
    .bind(&config)
    .bind(format_datetime(&handler.created_at))
    .execute(conn)
    .await
    .map_err(query_error)?;
    Ok(())
}

impl FormRepository for SqliteFormRepository {
    async fn create_form(&self, form: &Form) -> Result<Form, RepositoryError> {
        let mut conn = self.pool.writer.acquire().await.map_err(query_error)?;
        insert_form_row(&mut *conn, form).await?;
        Ok(form.clone())
    }

    async fn get_form(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM forms WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let form_row = FormRow::from_row(&row).map_err(query_error)?;
                Ok(Some(form_row.into_form()?))
            }
            None => Ok(None),
        }
    }

    async fn list_forms(&self, filter: Option<FormFilter>) -> Result<Vec<Form>, RepositoryError> {
        let filter = filter.unwrap_or_default();

        let mut sql = String::from("SELECT * FROM forms");
        let mut conditions: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(ref title) = filter.title_contains {
            conditions.push("LOWER(title) LIKE ?");
            binds.push(format!("%{}%", title.to_lowercase()));
        }
        if let Some(ref model) = filter.target_model {
            conditions.push("target_model = ?");
            binds.push(model.clone());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY created_at {order}, id {order}"));

        // SQLite needs a LIMIT before it accepts an OFFSET.
        match (filter.limit, filter.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut forms = Vec::with_capacity(rows.len());
        for row in &rows {
            let form_row = FormRow::from_row(row).map_err(query_error)?;
            forms.push(form_row.into_form()?);
        }
        Ok(forms)
    }

    async fn update_form(&self, form: &Form) -> Result<Form, RepositoryError> {
        let result = sqlx::query(
            "UPDATE forms SET title = ?, target_model = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&form.title)
        .bind(&form.target_model)
        .bind(format_datetime(&form.updated_at))
        .bind(form.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(form.clone())
    }

    async fn delete_form(&self, id: &FormId) -> Result<(), RepositoryError> {
        // Fields and handlers go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM forms WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn load_schema(&self, id: &FormId) -> Result<Option<FormSchema>, RepositoryError> {
        let Some(form) = self.get_form(id).await? else {
            return Ok(None);
        };

        let field_rows =
            sqlx::query("SELECT * FROM form_fields WHERE form_id = ? ORDER BY position, seq")
                .bind(id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(query_error)?;
        let mut fields = Vec::with_capacity(field_rows.len());
        for row in &field_rows {
            fields.push(FieldRow::from_row(row).map_err(query_error)?.into_field()?);
        }

        let handler_rows =
            sqlx::query("SELECT * FROM form_handlers WHERE form_id = ? ORDER BY position, seq")
                .bind(id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(query_error)?;
        let mut handlers = Vec::with_capacity(handler_rows.len());
        for row in &handler_rows {
            handlers.push(HandlerRow::from_row(row).map_err(query_error)?.into_handler()?);
        }

        Ok(Some(FormSchema {
            form,
            fields,
            handlers,
        }))
    }

    async fn insert_schema(&self, schema: &FormSchema) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        insert_form_row(&mut *tx, &schema.form).await?;
        // Rows go in storage order so seq preserves the source's tie order.
        for field in &schema.fields {
            insert_field_row(&mut *tx, field).await?;
        }
        for handler in &schema.handlers {
            insert_handler_row(&mut *tx, handler).await?;
        }

        tx.commit().await.map_err(query_error)?;
        tracing::debug!(
            form_id = %schema.form.id,
            fields = schema.fields.len(),
            handlers = schema.handlers.len(),
            "schema inserted"
        );
        Ok(())
    }

    async fn add_field(&self, field: &FieldDef) -> Result<FieldDef, RepositoryError> {
        let mut conn = self.pool.writer.acquire().await.map_err(query_error)?;
        insert_field_row(&mut *conn, field).await?;
        Ok(field.clone())
    }

    async fn add_fields(&self, fields: &[FieldDef]) -> Result<Vec<FieldDef>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        for field in fields {
            insert_field_row(&mut *tx, field).await?;
        }
        tx.commit().await.map_err(query_error)?;
        Ok(fields.to_vec())
    }

    async fn update_field(&self, field: &FieldDef) -> Result<FieldDef, RepositoryError> {
        let config = encode_config(&field.kind)?;

        let result = sqlx::query(
            "UPDATE form_fields SET name = ?, label = ?, help_text = ?, required = ?, widget = ?, position = ?, field_type = ?, config = ?
             WHERE id = ? AND form_id = ?",
        )
        .bind(&field.name)
        .bind(&field.label)
        .bind(&field.help_text)
        .bind(field.required)
        .bind(field.widget.as_str())
        .bind(field.order)
        .bind(field.field_type().as_str())
        .bind(&config)
        .bind(field.id.to_string())
        .bind(field.form_id.to_string())
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => Ok(field.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(field.name.clone())),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn delete_field(&self, form_id: &FormId, field_id: &FieldId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = ? AND form_id = ?")
            .bind(field_id.to_string())
            .bind(form_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_handler(&self, handler: &HandlerDef) -> Result<HandlerDef, RepositoryError> {
        let mut conn = self.pool.writer.acquire().await.map_err(query_error)?;
        insert_handler_row(&mut *conn, handler).await?;
        Ok(handler.clone())
    }

    async fn update_handler(&self, handler: &HandlerDef) -> Result<HandlerDef, RepositoryError> {
        let config = encode_config(&handler.kind)?;

        let result = sqlx::query(
            "UPDATE form_handlers SET name = ?, position = ?, handler_type = ?, config = ?
             WHERE id = ? AND form_id = ?",
        )
        .bind(&handler.name)
        .bind(handler.order)
        .bind(handler.handler_type().as_str())
        .bind(&config)
        .bind(handler.id.to_string())
        .bind(handler.form_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(handler.clone())
    }

    async fn delete_handler(
        &self,
        form_id: &FormId,
        handler_id: &HandlerId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM form_handlers WHERE id = ? AND form_id = ?")
            .bind(handler_id.to_string())
            .bind(form_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use chrono::Utc;
    use formforge_types::field::Choice;

    fn make_form(title: &str) -> Form {
        let now = Utc::now();
        Form {
            id: FormId::new(),
            title: title.to_string(),
            target_model: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_field(form_id: FormId, name: &str, kind: FieldKind, order: i32) -> FieldDef {
        FieldDef {
            id: FieldId::new(),
            form_id,
            name: name.to_string(),
            label: name.to_string(),
            help_text: String::new(),
            required: true,
            widget: Widget::TextInput,
            order,
            kind,
            created_at: Utc::now(),
        }
    }

    fn make_handler(form_id: FormId, name: &str, order: i32) -> HandlerDef {
        HandlerDef {
            id: HandlerId::new(),
            form_id,
            name: name.to_string(),
            order,
            kind: HandlerKind::SaveInstance {
                model: Some("contact".to_string()),
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_form() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Contact");

        repo.create_form(&form).await.unwrap();

        let found = repo.get_form(&form.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Contact");
        assert!(repo.get_form(&FormId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_field_kind_survives_storage() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Survey");
        repo.create_form(&form).await.unwrap();

        let kind = FieldKind::Choice {
            choices: vec![Choice::new("r", "Red"), Choice::new("g", "Green")],
            initial: Some("g".to_string()),
        };
        let field = make_field(form.id, "colour", kind.clone(), 0);
        repo.add_field(&field).await.unwrap();

        let schema = repo.load_schema(&form.id).await.unwrap().unwrap();
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].kind, kind);
        assert_eq!(schema.fields[0], field);
    }

    #[tokio::test]
    async fn test_config_column_has_no_type_tag() {
        let pool = test_pool().await;
        let repo = SqliteFormRepository::new(pool.clone());
        let form = make_form("Tags");
        repo.create_form(&form).await.unwrap();
        repo.add_field(&make_field(form.id, "age", FieldKind::empty(FieldType::Integer), 0))
            .await
            .unwrap();

        let (field_type, config): (String, String) =
            sqlx::query_as("SELECT field_type, config FROM form_fields")
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert_eq!(field_type, "integer");
        let config: serde_json::Value = serde_json::from_str(&config).unwrap();
        assert!(config.get("type").is_none());
    }

    #[tokio::test]
    async fn test_fields_ordered_with_insertion_ties() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Ordered");
        repo.create_form(&form).await.unwrap();

        for (name, order) in [("c", 5), ("a", 1), ("b", 5), ("z", 0)] {
            repo.add_field(&make_field(form.id, name, FieldKind::empty(FieldType::Char), order))
                .await
                .unwrap();
        }

        let schema = repo.load_schema(&form.id).await.unwrap().unwrap();
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_field_name_conflicts() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Dup");
        repo.create_form(&form).await.unwrap();

        repo.add_field(&make_field(form.id, "email", FieldKind::empty(FieldType::Email), 0))
            .await
            .unwrap();
        let err = repo
            .add_field(&make_field(form.id, "email", FieldKind::empty(FieldType::Char), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref n) if n == "email"));

        // Same name on another form is fine.
        let other = make_form("Other");
        repo.create_form(&other).await.unwrap();
        repo.add_field(&make_field(other.id, "email", FieldKind::empty(FieldType::Email), 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_fields_is_atomic() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Batch");
        repo.create_form(&form).await.unwrap();
        repo.add_field(&make_field(form.id, "email", FieldKind::empty(FieldType::Email), 0))
            .await
            .unwrap();

        let batch = vec![
            make_field(form.id, "name", FieldKind::empty(FieldType::Char), 1),
            make_field(form.id, "email", FieldKind::empty(FieldType::Char), 2),
        ];
        let err = repo.add_fields(&batch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref n) if n == "email"));

        let schema = repo.load_schema(&form.id).await.unwrap().unwrap();
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["email"]);

        let added = repo.add_fields(&batch[..1]).await.unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(repo.load_schema(&form.id).await.unwrap().unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn test_rename_onto_taken_name_conflicts() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Rename");
        repo.create_form(&form).await.unwrap();
        repo.add_field(&make_field(form.id, "a", FieldKind::empty(FieldType::Char), 0))
            .await
            .unwrap();
        let mut b = make_field(form.id, "b", FieldKind::empty(FieldType::Char), 1);
        repo.add_field(&b).await.unwrap();

        b.name = "a".to_string();
        let err = repo.update_field(&b).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unregistered_discriminator_is_integrity_error() {
        let pool = test_pool().await;
        let repo = SqliteFormRepository::new(pool.clone());
        let form = make_form("Broken");
        repo.create_form(&form).await.unwrap();
        repo.add_field(&make_field(form.id, "x", FieldKind::empty(FieldType::Char), 0))
            .await
            .unwrap();

        sqlx::query("UPDATE form_fields SET field_type = 'hologram'")
            .execute(&pool.writer)
            .await
            .unwrap();

        let err = repo.load_schema(&form.id).await.unwrap_err();
        match err {
            RepositoryError::Integrity(msg) => assert!(msg.contains("hologram")),
            other => panic!("expected Integrity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_form_cascades() {
        let pool = test_pool().await;
        let repo = SqliteFormRepository::new(pool.clone());
        let form = make_form("Cascade");
        repo.create_form(&form).await.unwrap();
        repo.add_field(&make_field(form.id, "x", FieldKind::empty(FieldType::Char), 0))
            .await
            .unwrap();
        repo.add_handler(&make_handler(form.id, "save", 0)).await.unwrap();

        repo.delete_form(&form.id).await.unwrap();

        let (fields,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM form_fields")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        let (handlers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM form_handlers")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!((fields, handlers), (0, 0));
        assert!(matches!(
            repo.delete_form(&form.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_field_scoped_to_form() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let a = make_form("A");
        let b = make_form("B");
        repo.create_form(&a).await.unwrap();
        repo.create_form(&b).await.unwrap();
        let field = make_field(a.id, "x", FieldKind::empty(FieldType::Char), 0);
        repo.add_field(&field).await.unwrap();

        assert!(matches!(
            repo.delete_field(&b.id, &field.id).await,
            Err(RepositoryError::NotFound)
        ));
        repo.delete_field(&a.id, &field.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_schema_is_atomic() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Atomic");
        let fields = vec![
            make_field(form.id, "same", FieldKind::empty(FieldType::Char), 0),
            make_field(form.id, "same", FieldKind::empty(FieldType::Char), 1),
        ];
        let schema = FormSchema {
            form: form.clone(),
            fields,
            handlers: vec![make_handler(form.id, "save", 0)],
        };

        assert!(repo.insert_schema(&schema).await.is_err());
        assert!(repo.get_form(&form.id).await.unwrap().is_none());
        assert!(repo.list_forms(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_forms_filters() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let mut bound = make_form("Contact us");
        bound.target_model = Some("contact".to_string());
        repo.create_form(&bound).await.unwrap();
        repo.create_form(&make_form("Newsletter")).await.unwrap();
        repo.create_form(&make_form("CONTACT sales")).await.unwrap();

        let all = repo.list_forms(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let contact = repo
            .list_forms(Some(FormFilter {
                title_contains: Some("contact".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(contact.len(), 2);

        let model_bound = repo
            .list_forms(Some(FormFilter {
                target_model: Some("contact".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(model_bound.len(), 1);
        assert_eq!(model_bound[0].id, bound.id);

        let page = repo
            .list_forms(Some(FormFilter {
                sort_order: Some(SortOrder::Asc),
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_handler_update_and_order() {
        let repo = SqliteFormRepository::new(test_pool().await);
        let form = make_form("Handlers");
        repo.create_form(&form).await.unwrap();
        let mut second = make_handler(form.id, "second", 2);
        repo.add_handler(&second).await.unwrap();
        repo.add_handler(&make_handler(form.id, "first", 1)).await.unwrap();

        second.order = 0;
        second.kind = HandlerKind::SaveInstance { model: None };
        repo.update_handler(&second).await.unwrap();

        let schema = repo.load_schema(&form.id).await.unwrap().unwrap();
        let names: Vec<&str> = schema.handlers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(schema.handlers[0].kind, HandlerKind::SaveInstance { model: None });
    }
}
