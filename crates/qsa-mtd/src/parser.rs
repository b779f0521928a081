//! MTD document parser
//!
//! An MTD file is a `<TMD>` element whose children describe the table and
//! its `<field>`s:
//!
//! ```xml
//! <!DOCTYPE TMD>
//! <TMD>
//!   <name>clientes</name>
//!   <alias>QT_TRANSLATE_NOOP("MetaData","Clientes")</alias>
//!   <field>
//!     <name>codcliente</name>
//!     <type>string</type>
//!     <length>6</length>
//!     <pk>true</pk>
//!   </field>
//! </TMD>
//! ```

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

use crate::error::MtdError;
use crate::model::{Association, Cardinality, Field, FieldType, Relation, Table};

/// Parse an MTD document for the table `table_name`
///
/// `table_name` comes from the file name and wins over the `<name>` and
/// `<query>` written in the document.
///
/// # Errors
///
/// Returns [`MtdError::MissingName`] when the document has no `<name>`,
/// [`MtdError::InvalidValue`] for unparsable flags and numbers, and
/// [`MtdError::Xml`] for malformed XML.
pub fn parse_mtd(xml: &str, table_name: &str) -> Result<Table, MtdError> {
    let xml = strip_doctype(xml);
    let package = parser::parse(&xml).map_err(|e| MtdError::Xml(e.to_string()))?;
    let document = package.as_document();
    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
        .ok_or_else(|| MtdError::Xml("document has no root element".into()))?;

    let mut table = Table::new(table_name);
    let mut declared = None;
    for element in child_elements(root) {
        let tag = element.name().local_part();
        match tag {
            "name" => declared = Some(text(element)),
            "alias" => table.alias = translated(&text(element)).to_string(),
            "query" => table.query = Some(text(element)),
            "concurWarn" => table.concur_warn = boolean(tag, &text(element))?,
            "detectLocks" => table.detect_locks = boolean(tag, &text(element))?,
            "FTSFunction" => table.fts_function = Some(text(element)),
            "field" => table.fields.push(field(element)?),
            other => tracing::debug!("{table_name}: ignoring <{other}>"),
        }
    }

    let declared = declared.ok_or(MtdError::MissingName)?;
    if declared != table_name {
        tracing::warn!("{table_name}.mtd declares <name>{declared}</name>, using {table_name}");
    }
    if let Some(query) = table.query.as_mut() {
        if query.as_str() != table_name {
            tracing::warn!("{table_name}.mtd declares <query>{query}</query>, using {table_name}");
            *query = table_name.to_string();
        }
    }
    Ok(table)
}

fn field(element: Element<'_>) -> Result<Field, MtdError> {
    let mut field = Field::new(String::new(), FieldType::Unknown(String::new()));
    let mut alias = None;
    for child in child_elements(element) {
        let tag = child.name().local_part();
        if tag == "relation" {
            field.relations.push(relation(child)?);
            continue;
        }
        if tag == "associated" {
            field.associated = Some(association(child));
            continue;
        }

        let value = text(child);
        match tag {
            "name" => field.name = value,
            "alias" => alias = Some(translated(&value).to_string()),
            "type" => field.field_type = FieldType::from_mtd(&value),
            "length" => field.length = number(tag, &value)?,
            "partI" => field.part_integer = number(tag, &value)?,
            "partD" => field.part_decimal = number(tag, &value)?,
            "pk" => field.pk = boolean(tag, &value)?,
            "ck" => field.ck = boolean(tag, &value)?,
            "null" => field.allow_null = boolean(tag, &value)?,
            "unique" => field.unique = boolean(tag, &value)?,
            "index" => field.index = boolean(tag, &value)?,
            "visible" => field.visible = boolean(tag, &value)?,
            "visiblegrid" => field.visible_grid = boolean(tag, &value)?,
            "editable" => field.editable = boolean(tag, &value)?,
            "calculated" => field.calculated = boolean(tag, &value)?,
            "counter" => field.counter = boolean(tag, &value)?,
            "outtransaction" => field.out_transaction = boolean(tag, &value)?,
            "default" => field.default_value = Some(value),
            "regexp" => field.regexp = Some(value),
            "optionslist" => {
                field.options_list = split_options(&value)
                    .into_iter()
                    .map(|option| translated(option.trim()).to_string())
                    .filter(|option| !option.is_empty())
                    .collect();
            }
            other => tracing::debug!("field {}: ignoring <{other}>", field.name),
        }
    }

    if field.name.is_empty() {
        return Err(MtdError::InvalidValue {
            tag: "name".into(),
            value: String::new(),
        });
    }
    field.alias = alias.unwrap_or_else(|| field.name.clone());
    Ok(field)
}

fn relation(element: Element<'_>) -> Result<Relation, MtdError> {
    let mut table = None;
    let mut foreign_field = None;
    let mut card = None;
    let mut delete_cascade = false;
    let mut update_cascade = false;
    let mut check_in = true;
    for child in child_elements(element) {
        let tag = child.name().local_part();
        let value = text(child);
        match tag {
            "table" => table = Some(value),
            "field" => foreign_field = Some(value),
            "card" => {
                card = Some(Cardinality::from_mtd(&value).ok_or_else(|| invalid(tag, &value))?);
            }
            "delC" => delete_cascade = boolean(tag, &value)?,
            "updC" => update_cascade = boolean(tag, &value)?,
            "checkIn" => check_in = boolean(tag, &value)?,
            other => tracing::debug!("relation: ignoring <{other}>"),
        }
    }

    Ok(Relation {
        card: card.ok_or_else(|| invalid("card", ""))?,
        table: table.ok_or_else(|| invalid("table", ""))?,
        field: foreign_field.ok_or_else(|| invalid("field", ""))?,
        delete_cascade,
        update_cascade,
        check_in,
    })
}

fn association(element: Element<'_>) -> Association {
    let mut association = Association {
        with: String::new(),
        by: String::new(),
    };
    for child in child_elements(element) {
        match child.name().local_part() {
            "with" => association.with = text(child),
            "by" => association.by = text(child),
            _ => {}
        }
    }
    association
}

// ==================== Values ====================

fn boolean(tag: &str, value: &str) -> Result<bool, MtdError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(tag, value))
    }
}

fn number(tag: &str, value: &str) -> Result<usize, MtdError> {
    value.parse().map_err(|_| invalid(tag, value))
}

fn invalid(tag: &str, value: &str) -> MtdError {
    MtdError::InvalidValue {
        tag: tag.to_string(),
        value: value.to_string(),
    }
}

/// Message of a `QT_TRANSLATE_NOOP("context","message")` marker
/// Split on commas that are outside quotes and parentheses
fn split_options(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

fn translated(value: &str) -> &str {
    value
        .strip_prefix("QT_TRANSLATE_NOOP(")
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|args| args.split_once(','))
        .map_or(value, |(_, message)| message.trim().trim_matches('"'))
}

// ==================== DOM helpers ====================

fn child_elements<'d>(element: Element<'d>) -> impl Iterator<Item = Element<'d>> {
    element.children().into_iter().filter_map(|child| match child {
        ChildOfElement::Element(element) => Some(element),
        _ => None,
    })
}

/// Trimmed text content of an element
fn text(element: Element<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        if let ChildOfElement::Text(text) = child {
            out.push_str(text.text());
        }
    }
    out.trim().to_string()
}

/// Drop the `<!DOCTYPE ...>` line the XML parser does not accept
fn strip_doctype(xml: &str) -> String {
    let Some(start) = xml.find("<!DOCTYPE") else {
        return xml.to_string();
    };
    match xml[start..].find('>') {
        Some(end) => format!("{}{}", &xml[..start], &xml[start + end + 1..]),
        None => xml.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENTES: &str = r#"<!DOCTYPE TMD>
<TMD>
  <name>clientes</name>
  <alias>QT_TRANSLATE_NOOP("MetaData","Clientes")</alias>
  <concurWarn>True</concurWarn>
  <field>
    <name>codcliente</name>
    <alias>QT_TRANSLATE_NOOP("MetaData","Código")</alias>
    <null>false</null>
    <pk>true</pk>
    <type>string</type>
    <length>6</length>
    <relation>
      <table>facturascli</table>
      <field>codcliente</field>
      <card>1M</card>
    </relation>
  </field>
  <field>
    <name>codgrupo</name>
    <type>string</type>
    <length>6</length>
    <relation>
      <table>gruposclientes</table>
      <field>codgrupo</field>
      <card>M1</card>
      <delC>true</delC>
    </relation>
  </field>
  <field>
    <name>credito</name>
    <type>double</type>
    <partI>8</partI>
    <partD>2</partD>
    <default>0</default>
  </field>
</TMD>
"#;

    #[test]
    fn parses_table_and_fields() {
        let table = parse_mtd(CLIENTES, "clientes").unwrap();
        assert_eq!(table.name, "clientes");
        assert_eq!(table.alias, "Clientes");
        assert!(table.concur_warn);
        assert_eq!(table.fields.len(), 3);

        let pk = table.primary_key().unwrap();
        assert_eq!(pk.name, "codcliente");
        assert_eq!(pk.alias, "Código");
        assert!(!pk.allow_null);
        assert_eq!(pk.length, 6);
        assert_eq!(pk.one_to_many().next().unwrap().table, "facturascli");

        let group = table.field("codgrupo").unwrap();
        let m1 = group.many_to_one().unwrap();
        assert!(m1.delete_cascade);
        assert!(!m1.update_cascade);
        assert!(m1.check_in);
        assert_eq!(group.alias, "codgrupo");

        let credit = table.field("credito").unwrap();
        assert_eq!(credit.field_type, FieldType::Double);
        assert_eq!((credit.part_integer, credit.part_decimal), (8, 2));
        assert_eq!(credit.default_value.as_deref(), Some("0"));
    }

    #[test]
    fn file_name_wins_over_declared_name() {
        let xml = "<TMD><name>clientes_old</name><query>qry</query></TMD>";
        let table = parse_mtd(xml, "clientes").unwrap();
        assert_eq!(table.name, "clientes");
        assert_eq!(table.query.as_deref(), Some("clientes"));
    }

    #[test]
    fn missing_name_is_an_error() {
        assert_eq!(
            parse_mtd("<TMD><alias>x</alias></TMD>", "t").unwrap_err(),
            MtdError::MissingName
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let xml = "<TMD><name>t</name><field><name>a</name><pk>yes</pk></field></TMD>";
        assert_eq!(
            parse_mtd(xml, "t").unwrap_err(),
            MtdError::InvalidValue {
                tag: "pk".into(),
                value: "yes".into()
            }
        );

        let xml = "<TMD><name>t</name><field><name>a</name><length>six</length></field></TMD>";
        assert!(matches!(
            parse_mtd(xml, "t").unwrap_err(),
            MtdError::InvalidValue { tag, .. } if tag == "length"
        ));

        let xml = "<TMD><name>t</name><field><name>a</name>\
                   <relation><table>x</table><field>y</field><card>MM</card></relation>\
                   </field></TMD>";
        assert!(matches!(parse_mtd(xml, "t"), Err(MtdError::InvalidValue { .. })));
    }

    #[test]
    fn malformed_xml() {
        assert!(matches!(parse_mtd("<TMD><name>t</TMD>", "t"), Err(MtdError::Xml(_))));
    }

    #[test]
    fn translate_marker() {
        assert_eq!(translated(r#"QT_TRANSLATE_NOOP("MetaData","Áreas")"#), "Áreas");
        assert_eq!(translated("Plain"), "Plain");
    }

    #[test]
    fn translated_options_keep_their_commas() {
        let table = parse_mtd(
            r#"<TMD><name>t</name><field><name>estado</name><type>string</type>
            <optionslist>QT_TRANSLATE_NOOP("MetaData","Pendiente"),QT_TRANSLATE_NOOP("MetaData","Cobrado, parcial"), Anulado</optionslist>
            </field></TMD>"#,
            "t",
        )
        .unwrap();
        assert_eq!(
            table.fields[0].options_list,
            vec!["Pendiente", "Cobrado, parcial", "Anulado"]
        );
    }

    #[test]
    fn plain_options_split_on_commas() {
        assert_eq!(split_options("A,B, C"), vec!["A", "B", " C"]);
        assert_eq!(split_options("f(a,b),'x,y'"), vec!["f(a,b)", "'x,y'"]);
    }
}
