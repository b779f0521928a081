//! Model generation from MTD files on disk

use std::fs;

use qsa_core::source::{FsProject, FsSink};
use qsa_core::Encoding;
use qsa_mtd::{generate_model, ModelOutcome, MtdProject, OrmConfig, OrmError};
use tempfile::TempDir;

const PEDIDOS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE TMD>
<TMD>
  <name>pedidos</name>
  <alias>QT_TRANSLATE_NOOP("MetaData","Pedidos")</alias>
  <field>
    <name>idpedido</name>
    <alias>QT_TRANSLATE_NOOP("MetaData","Identificador")</alias>
    <null>false</null>
    <pk>true</pk>
    <type>serial</type>
    <visiblegrid>false</visiblegrid>
  </field>
  <field>
    <name>codcliente</name>
    <type>string</type>
    <length>6</length>
    <relation>
      <table>clientes</table>
      <field>codcliente</field>
      <card>M1</card>
      <delC>true</delC>
    </relation>
  </field>
  <field>
    <name>total</name>
    <type>double</type>
    <partI>10</partI>
    <partD>2</partD>
  </field>
</TMD>
"#;

const NOTAS: &str = "<TMD><name>notas</name><field><name>texto</name><type>string</type></field></TMD>";

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("mtd")).unwrap();
        fs::write(dir.path().join("mtd/pedidos.mtd"), PEDIDOS).unwrap();
        fs::write(dir.path().join("mtd/notas.mtd"), NOTAS).unwrap();
        fs::write(
            dir.path().join("mtd/lineas.mtd"),
            PEDIDOS.replace("<name>pedidos</name>", "<name>lineaspedido</name>"),
        )
        .unwrap();
        Self { dir }
    }

    fn metadata(&self) -> MtdProject<FsProject> {
        MtdProject::new(FsProject::new(self.dir.path().join("mtd"), Encoding::Utf8))
    }

    fn config(&self) -> OrmConfig {
        OrmConfig::with_cache_root(self.dir.path().join("cache"))
    }

    fn generate(&self, table: &str) -> Result<ModelOutcome, OrmError> {
        generate_model(table, &self.metadata(), &FsSink, &self.config())
    }
}

#[test]
fn serial_primary_key_model() {
    let project = Project::new();
    let path = project.dir.path().join("cache/models/pedidos_model.py");
    assert_eq!(project.generate("pedidos").unwrap(), ModelOutcome::Written(path.clone()));

    let model = fs::read_to_string(&path).unwrap();
    assert!(model.contains("class Pedidos(basemodel.BaseModel):\n"));
    assert_eq!(model.matches("primary_key=True").count(), 1);
    assert!(model.contains(
        "    idpedido = sqlalchemy.Column('idpedido', sqlalchemy.Integer, primary_key=True)\n"
    ));
    assert_eq!(model.matches("'pk': True").count(), 1);
    let pk_entry = model.find("'pk': True").unwrap();
    let pk_field = model.find("'name': 'idpedido'").unwrap();
    let next_field = model.find("'name': 'codcliente'").unwrap();
    assert!(pk_field < pk_entry && pk_entry < next_field);

    assert!(model.contains("'alias': 'Identificador',"));
    assert!(model.contains("'visiblegrid': False,"));
    assert!(model.contains("    total = sqlalchemy.Column('total', sqlalchemy.Numeric(12, 2))\n"));
}

#[test]
fn many_to_one_relation_metadata() {
    let project = Project::new();
    project.generate("pedidos").unwrap();
    let model =
        fs::read_to_string(project.dir.path().join("cache/models/pedidos_model.py")).unwrap();

    assert!(model.contains(
        "'relations': [{'card': 'M1', 'table': 'clientes', 'field': 'codcliente', \
         'delc': True, 'updc': False, 'checkin': True}],"
    ));
    assert!(model.contains(
        "codcliente = sqlalchemy.Column('codcliente', sqlalchemy.String(6), \
         sqlalchemy.ForeignKey('clientes.codcliente', ondelete='CASCADE'))"
    ));
}

#[test]
fn table_without_primary_key_writes_nothing() {
    let project = Project::new();
    assert_eq!(project.generate("notas").unwrap(), ModelOutcome::NoPrimaryKey);
    assert!(!project.dir.path().join("cache/models/notas_model.py").exists());
}

#[test]
fn file_name_wins_over_declared_name() {
    let project = Project::new();
    project.generate("lineas").unwrap();
    let model =
        fs::read_to_string(project.dir.path().join("cache/models/lineas_model.py")).unwrap();
    assert!(model.contains("class Lineas("));
    assert!(model.contains("__tablename__ = 'lineas'"));
    assert!(!model.contains("lineaspedido"));
}

#[test]
fn cached_model_is_not_regenerated() {
    let project = Project::new();
    let path = project.dir.path().join("cache/models/pedidos_model.py");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "# cached\n").unwrap();

    assert_eq!(project.generate("pedidos").unwrap(), ModelOutcome::Skipped(path.clone()));
    assert_eq!(fs::read_to_string(&path).unwrap(), "# cached\n");
}

#[test]
fn unknown_table_is_an_error() {
    let project = Project::new();
    assert!(matches!(
        project.generate("facturas"),
        Err(OrmError::MetadataNotFound(name)) if name == "facturas"
    ));
}
