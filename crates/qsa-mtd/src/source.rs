//! Table metadata lookup

use std::collections::BTreeMap;

use qsa_core::source::ProjectSource;

use crate::model::Table;
use crate::parser::parse_mtd;

/// Supplies table metadata by table name
pub trait MetadataSource: Send + Sync {
    fn metadata(&self, table: &str) -> Option<Table>;
}

impl MetadataSource for BTreeMap<String, Table> {
    fn metadata(&self, table: &str) -> Option<Table> {
        self.get(table).cloned()
    }
}

/// Reads `<table>.mtd` files from a project
#[derive(Debug, Clone)]
pub struct MtdProject<P> {
    project: P,
}

impl<P: ProjectSource> MtdProject<P> {
    pub fn new(project: P) -> Self {
        Self { project }
    }
}

impl<P: ProjectSource> MetadataSource for MtdProject<P> {
    fn metadata(&self, table: &str) -> Option<Table> {
        let xml = self.project.file_content(&format!("{table}.mtd"))?;
        match parse_mtd(&xml, table) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("{table}.mtd: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsa_core::source::FsProject;
    use qsa_core::Encoding;
    use tempfile::TempDir;

    #[test]
    fn reads_mtd_files_by_table_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("paises.mtd"),
            "<TMD><name>paises</name><field><name>codpais</name><pk>true</pk></field></TMD>",
        )
        .unwrap();
        std::fs::write(dir.path().join("rotas.mtd"), "<TMD><alias>x</alias></TMD>").unwrap();

        let source = MtdProject::new(FsProject::new(dir.path(), Encoding::Utf8));
        let table = source.metadata("paises").unwrap();
        assert_eq!(table.primary_key().unwrap().name, "codpais");
        assert!(source.metadata("rotas").is_none());
        assert!(source.metadata("missing").is_none());
    }
}
