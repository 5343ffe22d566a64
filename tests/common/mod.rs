#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// A small shoe-store export shared by several end-to-end tests.
pub const SHOE_EXPORT: &str = "\
Artículo,Descripción,Marca,Rubro,Talle,Cantidad,Precio Lista,Valorizado
100000089,zapatilla running,Atomik,Calzado,42,3,\"15.000,00\",\"45.000,00\"
100000090,pantufla avengers,Marvel,Pantuflas,30,5,\"8.000,00\",\"40.000,00\"
100000091,botin de futbol,Atomik,Calzado,41,1,\"22.000,00\",\"22.000,00\"
";
