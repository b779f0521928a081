//! ORM model generation
//!
//! One Python module per table, defining a SQLAlchemy mapped class:
//!
//! ```text
//! class Clientes(basemodel.BaseModel):
//!     """Clientes class."""
//!
//!     __tablename__ = 'clientes'
//!
//!     legacy_metadata = {...}
//!
//!     codcliente = sqlalchemy.Column('codcliente', sqlalchemy.String(6), primary_key=True)
//! ```
//!
//! `legacy_metadata` keeps every attribute that differs from the MTD
//! defaults so the runtime can rebuild the original metadata.

use std::path::PathBuf;

use qsa_core::source::ArtifactSink;

use crate::config::OrmConfig;
use crate::error::OrmError;
use crate::model::{Field, FieldType, Relation, Table};
use crate::source::MetadataSource;

const INDENT: &str = "    ";

/// What [`generate_model`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    Written(PathBuf),
    /// A cached model already exists
    Skipped(PathBuf),
    /// The table has no primary key; nothing was written
    NoPrimaryKey,
    /// The metadata is inconsistent; nothing was written
    Invalid,
}

/// Generate the model for `table` unless it is already cached
///
/// Missing primary keys and duplicate fields are logged and reported as an
/// outcome, never as an error.
///
/// # Errors
///
/// Returns [`OrmError::MetadataNotFound`] when `metadata` does not know the
/// table and [`OrmError::Io`] when the model cannot be written.
pub fn generate_model(
    table: &str,
    metadata: &dyn MetadataSource,
    sink: &dyn ArtifactSink,
    config: &OrmConfig,
) -> Result<ModelOutcome, OrmError> {
    let path = config.model_path(table);
    if sink.exists(&path) {
        tracing::debug!("{} already exists, skipping", path.display());
        return Ok(ModelOutcome::Skipped(path));
    }

    let model = metadata
        .metadata(table)
        .ok_or_else(|| OrmError::MetadataNotFound(table.to_string()))?;
    let text = match render_model(&model, config) {
        Ok(text) => text,
        Err(e @ OrmError::NoPrimaryKey(_)) => {
            tracing::warn!("{e}, no model generated");
            return Ok(ModelOutcome::NoPrimaryKey);
        }
        Err(e @ OrmError::DuplicateField { .. }) => {
            tracing::warn!("{e}, no model generated");
            return Ok(ModelOutcome::Invalid);
        }
        Err(e) => return Err(e),
    };

    sink.write_file(&path, text.as_bytes())
        .map_err(|source| OrmError::Io {
            path: path.clone(),
            source,
        })?;
    tracing::info!("generated model for {table} at {}", path.display());
    Ok(ModelOutcome::Written(path))
}

/// Python source of the model for `table`
///
/// # Errors
///
/// Returns [`OrmError::NoPrimaryKey`] or [`OrmError::DuplicateField`] when
/// the table cannot be mapped.
pub fn render_model(table: &Table, config: &OrmConfig) -> Result<String, OrmError> {
    if let Some(field) = table.duplicate_field() {
        return Err(OrmError::DuplicateField {
            table: table.name.clone(),
            field: field.to_string(),
        });
    }
    if table.primary_key().is_none() {
        return Err(OrmError::NoPrimaryKey(table.name.clone()));
    }

    let class = class_name(&table.name);
    let mut out = ModelWriter::default();
    out.line(0, "# -*- coding: utf-8 -*-");
    out.line(0, &format!("# Generated from {}.mtd", table.name));
    out.line(0, &format!("\"\"\"{class}_model module.\"\"\""));
    out.blank();
    out.line(0, "import sqlalchemy");
    out.line(0, "from sqlalchemy import orm");
    out.blank();
    out.line(0, &config.base_import);
    out.blank();
    out.blank();
    out.line(0, &format!("class {class}({}):", config.base_class));
    out.line(1, &format!("\"\"\"{class} class.\"\"\""));
    out.blank();
    out.line(1, &format!("__tablename__ = {}", py_str(&table.name)));
    out.blank();
    out.line(1, "# --- Metadata --->");
    out.blank();
    legacy_metadata(&mut out, table);
    out.blank();
    out.line(1, "# --- Fields --->");
    out.blank();
    for field in &table.fields {
        out.line(1, &column(field));
    }

    let relations: Vec<(&Field, &Relation)> = table
        .fields
        .iter()
        .flat_map(|field| field.one_to_many().map(move |relation| (field, relation)))
        .collect();
    if !relations.is_empty() {
        out.blank();
        out.line(1, "# --- Relations 1:M --->");
        out.blank();
        for (field, relation) in relations {
            out.line(1, &relationship(&class, field, relation));
        }
    }
    Ok(out.finish())
}

/// Table name with the first letter upper-cased
pub fn class_name(table: &str) -> String {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ==================== Columns ====================

fn column(field: &Field) -> String {
    let mut args = vec![py_str(&field.name), column_type(field)];
    if let Some(relation) = field.many_to_one() {
        args.push(foreign_key(relation));
    }
    if field.pk {
        args.push("primary_key=True".to_string());
    } else if !field.allow_null {
        args.push("nullable=False".to_string());
    }
    if field.unique && !field.pk {
        args.push("unique=True".to_string());
    }
    if field.index {
        args.push("index=True".to_string());
    }
    format!("{} = sqlalchemy.Column({})", field.name, args.join(", "))
}

fn column_type(field: &Field) -> String {
    match &field.field_type {
        FieldType::Int | FieldType::Serial => "sqlalchemy.Integer".to_string(),
        FieldType::UInt => "sqlalchemy.BigInteger".to_string(),
        FieldType::Double => {
            let precision = field.part_integer + field.part_decimal;
            if precision == 0 {
                "sqlalchemy.Float".to_string()
            } else {
                format!("sqlalchemy.Numeric({precision}, {})", field.part_decimal)
            }
        }
        FieldType::String | FieldType::StringList | FieldType::Pixmap => {
            if field.length > 0 {
                format!("sqlalchemy.String({})", field.length)
            } else {
                "sqlalchemy.String".to_string()
            }
        }
        FieldType::Bool | FieldType::Unlock => "sqlalchemy.Boolean".to_string(),
        FieldType::Date => "sqlalchemy.Date".to_string(),
        FieldType::Time => "sqlalchemy.Time".to_string(),
        FieldType::Timestamp => "sqlalchemy.DateTime".to_string(),
        FieldType::ByteArray => "sqlalchemy.LargeBinary".to_string(),
        FieldType::Calculated => "sqlalchemy.String".to_string(),
        FieldType::Unknown(name) => {
            tracing::warn!("field {}: unknown type '{name}'", field.name);
            py_str(&format!("Unknown type {name}"))
        }
    }
}

fn foreign_key(relation: &Relation) -> String {
    let mut args = vec![py_str(&format!("{}.{}", relation.table, relation.field))];
    if relation.delete_cascade {
        args.push("ondelete='CASCADE'".to_string());
    }
    if relation.update_cascade {
        args.push("onupdate='CASCADE'".to_string());
    }
    format!("sqlalchemy.ForeignKey({})", args.join(", "))
}

fn relationship(class: &str, field: &Field, relation: &Relation) -> String {
    let foreign = class_name(&relation.table);
    let join = format!(
        "{class}.{} == orm.foreign({foreign}.{})",
        field.name, relation.field
    );
    format!(
        "{}_{} = orm.relationship({}, primaryjoin={}, viewonly=True)",
        relation.table,
        relation.field,
        py_str(&foreign),
        py_str(&join)
    )
}

// ==================== Legacy metadata ====================

fn legacy_metadata(out: &mut ModelWriter, table: &Table) {
    out.line(1, "legacy_metadata = {");
    out.line(2, &entry("name", py_str(&table.name)));
    out.line(2, &entry("alias", py_str(&table.alias)));
    if let Some(query) = &table.query {
        out.line(2, &entry("query", py_str(query)));
    }
    if table.concur_warn {
        out.line(2, &entry("concurWarn", "True".into()));
    }
    if table.detect_locks {
        out.line(2, &entry("detectLocks", "True".into()));
    }
    if let Some(function) = &table.fts_function {
        out.line(2, &entry("FTSFunction", py_str(function)));
    }
    out.line(2, "'fields': [");
    for field in &table.fields {
        out.line(3, "{");
        for line in field_entries(field) {
            out.line(4, &line);
        }
        out.line(3, "},");
    }
    out.line(2, "],");
    out.line(1, "}");
}

/// Entries of a field that differ from the MTD defaults
fn field_entries(field: &Field) -> Vec<String> {
    let defaults = Field::new(field.name.clone(), field.field_type.clone());
    let mut entries = vec![
        entry("name", py_str(&field.name)),
        entry("alias", py_str(&field.alias)),
        entry("type", py_str(field.field_type.as_str())),
    ];

    let numbers = [
        ("length", field.length, defaults.length),
        ("partI", field.part_integer, defaults.part_integer),
        ("partD", field.part_decimal, defaults.part_decimal),
    ];
    for (key, value, default) in numbers {
        if value != default {
            entries.push(entry(key, value.to_string()));
        }
    }

    let flags = [
        ("pk", field.pk, defaults.pk),
        ("ck", field.ck, defaults.ck),
        ("null", field.allow_null, defaults.allow_null),
        ("unique", field.unique, defaults.unique),
        ("index", field.index, defaults.index),
        ("visible", field.visible, defaults.visible),
        ("visiblegrid", field.visible_grid, defaults.visible_grid),
        ("editable", field.editable, defaults.editable),
        ("calculated", field.calculated, defaults.calculated),
        ("counter", field.counter, defaults.counter),
        ("outtransaction", field.out_transaction, defaults.out_transaction),
    ];
    for (key, value, default) in flags {
        if value != default {
            entries.push(entry(key, py_bool(value).into()));
        }
    }

    if let Some(value) = &field.default_value {
        entries.push(entry("default", default_literal(&field.field_type, value)));
    }
    if let Some(regexp) = &field.regexp {
        entries.push(entry("regexp", py_str(regexp)));
    }
    if !field.options_list.is_empty() {
        let options: Vec<String> = field.options_list.iter().map(|o| py_str(o)).collect();
        entries.push(entry("optionslist", format!("[{}]", options.join(", "))));
    }
    if !field.relations.is_empty() {
        let relations: Vec<String> = field.relations.iter().map(relation_literal).collect();
        entries.push(entry("relations", format!("[{}]", relations.join(", "))));
    }
    if let Some(associated) = &field.associated {
        entries.push(entry(
            "associated",
            format!(
                "{{'with': {}, 'by': {}}}",
                py_str(&associated.with),
                py_str(&associated.by)
            ),
        ));
    }
    entries
}

fn relation_literal(relation: &Relation) -> String {
    format!(
        "{{'card': {}, 'table': {}, 'field': {}, 'delc': {}, 'updc': {}, 'checkin': {}}}",
        py_str(relation.card.as_str()),
        py_str(&relation.table),
        py_str(&relation.field),
        py_bool(relation.delete_cascade),
        py_bool(relation.update_cascade),
        py_bool(relation.check_in)
    )
}

/// Default value as a literal of the field's type
fn default_literal(field_type: &FieldType, value: &str) -> String {
    match field_type {
        FieldType::Bool | FieldType::Unlock => {
            py_bool(value.eq_ignore_ascii_case("true")).to_string()
        }
        FieldType::Int | FieldType::UInt | FieldType::Serial if value.parse::<i64>().is_ok() => {
            value.to_string()
        }
        FieldType::Double if value.parse::<f64>().is_ok() => value.to_string(),
        _ => py_str(value),
    }
}

fn entry(key: &str, value: String) -> String {
    format!("{}: {value},", py_str(key))
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Single-quoted Python string literal
fn py_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[derive(Default)]
struct ModelWriter {
    out: String,
}

impl ModelWriter {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cardinality;

    fn field(name: &str, field_type: FieldType) -> Field {
        Field::new(name, field_type)
    }

    fn areas() -> Table {
        let mut table = Table::new("flareas");
        table.alias = "Áreas".into();
        let mut id = field("idarea", FieldType::String);
        id.pk = true;
        id.length = 15;
        id.allow_null = false;
        table.fields.push(id);
        let mut lock = field("bloqueo", FieldType::Unlock);
        lock.default_value = Some("true".into());
        table.fields.push(lock);
        table
    }

    #[test]
    fn class_names() {
        assert_eq!(class_name("flareas"), "Flareas");
        assert_eq!(class_name("áreas"), "Áreas");
        assert_eq!(class_name(""), "");
    }

    #[test]
    fn renders_class_and_columns() {
        let source = render_model(&areas(), &OrmConfig::default()).unwrap();
        assert!(source.contains("\nclass Flareas(basemodel.BaseModel):\n    \"\"\"Flareas class.\"\"\"\n"));
        assert!(source.contains("    __tablename__ = 'flareas'\n"));
        assert!(source.contains(
            "    idarea = sqlalchemy.Column('idarea', sqlalchemy.String(15), primary_key=True)\n"
        ));
        assert!(source.contains("    bloqueo = sqlalchemy.Column('bloqueo', sqlalchemy.Boolean)\n"));
        assert!(source.contains("from pineboolib.application.database.orm import basemodel\n"));
    }

    #[test]
    fn legacy_metadata_keeps_non_defaults() {
        let source = render_model(&areas(), &OrmConfig::default()).unwrap();
        assert!(source.contains("        'alias': 'Áreas',\n"));
        assert!(source.contains("                'length': 15,\n"));
        assert!(source.contains("                'pk': True,\n"));
        assert!(source.contains("                'null': False,\n"));
        assert!(source.contains("                'default': True,\n"));
        // defaults stay implicit
        assert!(!source.contains("'visible'"));
        assert_eq!(source.matches("'pk': True").count(), 1);
    }

    #[test]
    fn type_mapping() {
        let mut price = field("pvp", FieldType::Double);
        price.part_integer = 8;
        price.part_decimal = 2;
        assert_eq!(column_type(&price), "sqlalchemy.Numeric(10, 2)");
        price.part_integer = 0;
        price.part_decimal = 0;
        assert_eq!(column_type(&price), "sqlalchemy.Float");

        assert_eq!(column_type(&field("n", FieldType::UInt)), "sqlalchemy.BigInteger");
        assert_eq!(column_type(&field("d", FieldType::Timestamp)), "sqlalchemy.DateTime");
        assert_eq!(column_type(&field("b", FieldType::ByteArray)), "sqlalchemy.LargeBinary");
        assert_eq!(column_type(&field("s", FieldType::String)), "sqlalchemy.String");
        assert_eq!(
            column_type(&field("x", FieldType::Unknown("money".into()))),
            "'Unknown type money'"
        );
    }

    #[test]
    fn relations_render_both_ways() {
        let mut table = Table::new("clientes");
        let mut id = field("codcliente", FieldType::String);
        id.pk = true;
        id.relations.push(Relation::new(Cardinality::OneToMany, "facturascli", "codcliente"));
        table.fields.push(id);
        let mut group = field("codgrupo", FieldType::String);
        let mut m1 = Relation::new(Cardinality::ManyToOne, "gruposclientes", "codgrupo");
        m1.delete_cascade = true;
        group.relations.push(m1);
        table.fields.push(group);

        let source = render_model(&table, &OrmConfig::default()).unwrap();
        assert!(source.contains(
            "sqlalchemy.ForeignKey('gruposclientes.codgrupo', ondelete='CASCADE')"
        ));
        assert!(source.contains(
            "{'card': 'M1', 'table': 'gruposclientes', 'field': 'codgrupo', \
             'delc': True, 'updc': False, 'checkin': True}"
        ));
        assert!(source.contains(
            "    facturascli_codcliente = orm.relationship('Facturascli', \
             primaryjoin='Clientes.codcliente == orm.foreign(Facturascli.codcliente)', viewonly=True)\n"
        ));
    }

    #[test]
    fn unmappable_tables_are_errors() {
        let mut table = Table::new("logs");
        table.fields.push(field("texto", FieldType::String));
        assert!(matches!(
            render_model(&table, &OrmConfig::default()),
            Err(OrmError::NoPrimaryKey(name)) if name == "logs"
        ));

        let mut table = areas();
        table.fields.push(field("bloqueo", FieldType::Bool));
        assert!(matches!(
            render_model(&table, &OrmConfig::default()),
            Err(OrmError::DuplicateField { field, .. }) if field == "bloqueo"
        ));
    }

    #[test]
    fn string_literals_escape_quotes() {
        assert_eq!(py_str("it's"), "'it\\'s'");
        assert_eq!(py_str("a\\b"), "'a\\\\b'");
    }
}
