//! Table, field and relation model
//!
//! Built by [`crate::parser::parse_mtd`] and consumed by the ORM generator.

use std::collections::BTreeSet;
use std::fmt;

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Int,
    UInt,
    Double,
    Bool,
    /// Boolean lock flag
    Unlock,
    String,
    StringList,
    Pixmap,
    Date,
    Time,
    Timestamp,
    ByteArray,
    Serial,
    Calculated,
    /// Any other spelling, kept verbatim
    Unknown(String),
}

impl FieldType {
    /// Type from its MTD spelling
    pub fn from_mtd(name: &str) -> Self {
        match name {
            "int" => FieldType::Int,
            "uint" => FieldType::UInt,
            "double" => FieldType::Double,
            "bool" => FieldType::Bool,
            "unlock" => FieldType::Unlock,
            "string" => FieldType::String,
            "stringlist" => FieldType::StringList,
            "pixmap" => FieldType::Pixmap,
            "date" => FieldType::Date,
            "time" => FieldType::Time,
            "timestamp" => FieldType::Timestamp,
            "bytearray" => FieldType::ByteArray,
            "serial" => FieldType::Serial,
            "calculated" => FieldType::Calculated,
            other => FieldType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Int => "int",
            FieldType::UInt => "uint",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::Unlock => "unlock",
            FieldType::String => "string",
            FieldType::StringList => "stringlist",
            FieldType::Pixmap => "pixmap",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Timestamp => "timestamp",
            FieldType::ByteArray => "bytearray",
            FieldType::Serial => "serial",
            FieldType::Calculated => "calculated",
            FieldType::Unknown(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a relation, seen from the field that declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `1M`: rows of the foreign table point at this field
    OneToMany,
    /// `M1`: this field points at a row of the foreign table
    ManyToOne,
}

impl Cardinality {
    pub fn from_mtd(card: &str) -> Option<Self> {
        match card {
            "1M" => Some(Cardinality::OneToMany),
            "M1" => Some(Cardinality::ManyToOne),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToMany => "1M",
            Cardinality::ManyToOne => "M1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub card: Cardinality,
    pub table: String,
    pub field: String,
    pub delete_cascade: bool,
    pub update_cascade: bool,
    pub check_in: bool,
}

impl Relation {
    pub fn new(card: Cardinality, table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            card,
            table: table.into(),
            field: field.into(),
            delete_cascade: false,
            update_cascade: false,
            check_in: true,
        }
    }
}

/// `<associated>`: the field filters on another field of the related table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub with: String,
    pub by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub alias: String,
    pub field_type: FieldType,
    pub length: usize,
    /// Integer digits of a `double`
    pub part_integer: usize,
    /// Decimal digits of a `double`
    pub part_decimal: usize,
    pub pk: bool,
    /// Part of a compound key
    pub ck: bool,
    pub allow_null: bool,
    pub unique: bool,
    pub index: bool,
    pub visible: bool,
    pub visible_grid: bool,
    pub editable: bool,
    pub calculated: bool,
    pub counter: bool,
    pub out_transaction: bool,
    pub default_value: Option<String>,
    pub regexp: Option<String>,
    pub options_list: Vec<String>,
    pub relations: Vec<Relation>,
    pub associated: Option<Association>,
}

impl Field {
    /// Field with MTD defaults
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            field_type,
            length: 0,
            part_integer: 4,
            part_decimal: 0,
            pk: false,
            ck: false,
            allow_null: true,
            unique: false,
            index: false,
            visible: true,
            visible_grid: true,
            editable: true,
            calculated: false,
            counter: false,
            out_transaction: false,
            default_value: None,
            regexp: None,
            options_list: Vec::new(),
            relations: Vec::new(),
            associated: None,
        }
    }

    /// The `M1` relation, if any
    pub fn many_to_one(&self) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| relation.card == Cardinality::ManyToOne)
    }

    pub fn one_to_many(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|relation| relation.card == Cardinality::OneToMany)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub alias: String,
    /// Set when the table is a view over a query
    pub query: Option<String>,
    pub concur_warn: bool,
    pub detect_locks: bool,
    pub fts_function: Option<String>,
    pub fields: Vec<Field>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            query: None,
            concur_warn: false,
            detect_locks: false,
            fts_function: None,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// First primary key field
    pub fn primary_key(&self) -> Option<&Field> {
        self.fields.iter().find(|field| field.pk)
    }

    /// First field name declared more than once
    pub fn duplicate_field(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.fields
            .iter()
            .map(|field| field.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_types_keep_their_spelling() {
        for name in ["int", "uint", "double", "unlock", "stringlist", "serial", "calculated"] {
            assert_eq!(FieldType::from_mtd(name).as_str(), name);
        }
        assert_eq!(
            FieldType::from_mtd("money"),
            FieldType::Unknown("money".into())
        );
    }

    #[test]
    fn relations_by_cardinality() {
        let mut field = Field::new("codcliente", FieldType::String);
        field.relations.push(Relation::new(Cardinality::OneToMany, "facturascli", "codcliente"));
        field.relations.push(Relation::new(Cardinality::ManyToOne, "clientes", "codcliente"));
        assert_eq!(field.many_to_one().unwrap().table, "clientes");
        assert_eq!(field.one_to_many().count(), 1);
    }

    #[test]
    fn table_lookups() {
        let mut table = Table::new("clientes");
        assert!(table.primary_key().is_none());
        table.fields.push(Field::new("nombre", FieldType::String));
        let mut id = Field::new("codcliente", FieldType::String);
        id.pk = true;
        table.fields.push(id);
        assert_eq!(table.primary_key().unwrap().name, "codcliente");
        assert!(table.duplicate_field().is_none());

        table.fields.push(Field::new("nombre", FieldType::String));
        assert_eq!(table.duplicate_field(), Some("nombre"));
    }
}
