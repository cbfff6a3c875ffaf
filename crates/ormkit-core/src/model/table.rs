//! Declarative table definitions.

use serde::{Deserialize, Serialize};

use super::ModelDefinition;
use crate::error::Error;
use crate::family::DatabaseFamily;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    AutoIncrement,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Boolean.
    Boolean,
    /// Double precision float.
    Real,
    /// Variable-length string with a maximum length.
    Varchar(u32),
    /// Unbounded text.
    Text,
    /// Date and time.
    DateTime,
    /// Binary data.
    Blob,
}

impl ColumnType {
    /// SQL type in the given dialect.
    pub fn sql_type(self, family: DatabaseFamily) -> String {
        use DatabaseFamily::*;

        let sql = match (self, family) {
            (Self::AutoIncrement, MySql) => "integer NOT NULL PRIMARY KEY AUTO_INCREMENT",
            (Self::AutoIncrement, PostgreSql) => "serial PRIMARY KEY",
            (Self::AutoIncrement, MsSql) => "int NOT NULL PRIMARY KEY IDENTITY(1,1)",
            (Self::AutoIncrement, _) => "INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
            (Self::Integer, MsSql) => "int",
            (Self::Integer, _) => "integer",
            (Self::BigInteger, _) => "bigint",
            (Self::Boolean, PostgreSql) => "boolean",
            (Self::Boolean, MsSql) => "bit",
            (Self::Boolean, _) => "bool",
            (Self::Real, MySql) => "double",
            (Self::Real, PostgreSql) => "double precision",
            (Self::Real, MsSql) => "float",
            (Self::Real, _) => "real",
            (Self::Varchar(len), MsSql) => return format!("nvarchar({len})"),
            (Self::Varchar(len), _) => return format!("varchar({len})"),
            (Self::Text, MsSql) => "nvarchar(max)",
            (Self::Text, _) => "text",
            (Self::DateTime, PostgreSql) => "timestamp",
            (Self::DateTime, _) => "datetime",
            (Self::Blob, PostgreSql) => "bytea",
            (Self::Blob, MsSql) => "varbinary(max)",
            (Self::Blob, _) => "blob",
        };
        sql.to_string()
    }

    /// Whether the type already declares the primary key.
    pub fn is_auto_increment(self) -> bool {
        self == Self::AutoIncrement
    }
}

/// Behavior when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteBehavior {
    /// Delete referencing rows.
    Cascade,
    /// Prevent deletion while referencing rows exist.
    #[default]
    Restrict,
    /// Set the referencing column to NULL.
    SetNull,
}

impl DeleteBehavior {
    fn sql(self, family: DatabaseFamily) -> &'static str {
        match (self, family) {
            (Self::Cascade, _) => "CASCADE",
            (Self::Restrict, DatabaseFamily::MsSql) => "NO ACTION",
            (Self::Restrict, _) => "RESTRICT",
            (Self::SetNull, _) => "SET NULL",
        }
    }
}

fn default_reference_column() -> String {
    "id".to_string()
}

/// Reference from a column to another model's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced model name.
    pub model: String,
    /// Referenced table, the lowercased model name when unset.
    #[serde(default)]
    pub table: Option<String>,
    /// Referenced column.
    #[serde(default = "default_reference_column")]
    pub column: String,
    /// Delete behavior.
    #[serde(default)]
    pub on_delete: DeleteBehavior,
}

impl ForeignKey {
    /// Reference the `id` column of `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            table: None,
            column: default_reference_column(),
            on_delete: DeleteBehavior::default(),
        }
    }

    /// Set the referenced table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the referenced column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Set delete behavior.
    pub fn with_on_delete(mut self, on_delete: DeleteBehavior) -> Self {
        self.on_delete = on_delete;
        self
    }

    /// Referenced table name.
    pub fn referenced_table(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.model.to_lowercase())
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    #[serde(default)]
    pub nullable: bool,
    /// Whether this is the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether values must be unique.
    #[serde(default)]
    pub unique: bool,
    /// Whether to create an index on the column.
    #[serde(default)]
    pub indexed: bool,
    /// Reference to another model.
    #[serde(default)]
    pub foreign_key: Option<ForeignKey>,
}

impl FieldDef {
    /// Create a required column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
            unique: false,
            indexed: false,
            foreign_key: None,
        }
    }

    /// Create a nullable column.
    pub fn optional(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, column_type)
        }
    }

    /// Create an auto-incrementing primary key.
    pub fn auto_increment(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::AutoIncrement)
    }

    /// Create an integer column referencing `model`.
    pub fn foreign_key(name: impl Into<String>, foreign_key: ForeignKey) -> Self {
        Self {
            foreign_key: Some(foreign_key),
            ..Self::new(name, ColumnType::Integer)
        }
    }

    /// Mark as primary key.
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as unique.
    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as indexed.
    pub fn with_index(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Allow NULL.
    pub fn with_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn column_sql(&self, family: DatabaseFamily) -> String {
        let mut sql = format!(
            "{} {}",
            family.quote_identifier(&self.name),
            self.column_type.sql_type(family)
        );
        if self.column_type.is_auto_increment() {
            return sql;
        }
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}

/// A model backed by one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTableDef")]
pub struct TableDef {
    /// Model name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Column definitions.
    pub fields: Vec<FieldDef>,
}

/// Serialized form, where the table name may be omitted.
#[derive(Deserialize)]
struct RawTableDef {
    name: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

impl From<RawTableDef> for TableDef {
    fn from(raw: RawTableDef) -> Self {
        let table = raw.table.unwrap_or_else(|| raw.name.to_lowercase());
        Self {
            name: raw.name,
            table,
            fields: raw.fields,
        }
    }
}

impl TableDef {
    /// Create a model definition with no columns. The table is named after
    /// the lowercased model name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = name.to_lowercase();
        Self {
            name,
            table,
            fields: Vec::new(),
        }
    }

    /// Set the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Add a column.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add several columns.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Get a column by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check the definition can produce DDL.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::Schema("model name is empty".into()));
        }
        if self.table.is_empty() {
            return Err(Error::Schema(format!("model {} has no table name", self.name)));
        }
        if self.fields.is_empty() {
            return Err(Error::Schema(format!("model {} has no fields", self.name)));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(Error::Schema(format!(
                    "model {} has a field without a name",
                    self.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::Schema(format!(
                    "model {} declares field {} twice",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }
}

impl ModelDefinition for TableDef {
    fn table(&self) -> &str {
        &self.table
    }

    fn foreign_models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for fk in self.fields.iter().filter_map(|f| f.foreign_key.as_ref()) {
            if !models.contains(&fk.model) {
                models.push(fk.model.clone());
            }
        }
        models
    }

    fn create_table_sql(&self, family: DatabaseFamily) -> Vec<String> {
        let table = family.quote_identifier(&self.table);

        let mut parts: Vec<String> = self.fields.iter().map(|f| f.column_sql(family)).collect();
        for field in &self.fields {
            if let Some(fk) = &field.foreign_key {
                parts.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                    family.quote_identifier(&field.name),
                    family.quote_identifier(&fk.referenced_table()),
                    family.quote_identifier(&fk.column),
                    fk.on_delete.sql(family)
                ));
            }
        }

        let mut statements = vec![format!("CREATE TABLE {} ({})", table, parts.join(", "))];

        // MySQL indexes foreign key columns on its own.
        for field in &self.fields {
            let wants_index = field.indexed
                || (field.foreign_key.is_some() && family != DatabaseFamily::MySql);
            if wants_index && !field.primary_key && !field.column_type.is_auto_increment() {
                statements.push(format!(
                    "CREATE INDEX {} ON {} ({})",
                    family.quote_identifier(&format!("{}_{}_idx", self.table, field.name)),
                    table,
                    family.quote_identifier(&field.name)
                ));
            }
        }
        statements
    }
}
