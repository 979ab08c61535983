//! Módulo `excel`: lectura de la planilla de notas.
//!
//! Submódulos:
//! - `io`: conversión de celdas calamine y lectura de hojas
//! - `columnas`: normalización de encabezados a nombres canónicos

/// Helpers de IO y lectura de hojas
pub mod io;

/// Renombrado de variantes de encabezado
pub mod columnas;

pub use columnas::{columnas_faltantes, normalizar_columnas};
pub use io::{leer_hoja, nombres_hojas};

use crate::config::TablasMapeo;
use crate::error::{NotadorError, Result};
use std::path::Path;

/// Columna canónica que identifica al estudiante.
pub const COLUMNA_ESTUDIANTE: &str = "estudiante";
pub const COLUMNA_GRUPO: &str = "GRUPO";
pub const COLUMNA_PERIODO: &str = "PERIODO";

/// Lista las hojas de grado (todas salvo la pestaña consolidado).
///
/// Cada hoja debe tener la columna `estudiante` tras normalizar; si falta
/// en alguna se devuelve `Validacion` nombrando la hoja.
pub fn listar_grados<P: AsRef<Path>>(path: P, tablas: &TablasMapeo) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut grados = Vec::new();
    for hoja in nombres_hojas(path)? {
        if tablas.es_hoja_consolidado(&hoja) {
            continue;
        }
        let leida = leer_hoja(path, &hoja, &tablas.sinonimos_columnas)?;
        let faltantes = columnas_faltantes(&leida.columnas, &[COLUMNA_ESTUDIANTE]);
        if !faltantes.is_empty() {
            return Err(NotadorError::Validacion(format!(
                "Faltan columnas requeridas en la hoja {}: {}",
                hoja,
                faltantes.join(", ")
            )));
        }
        grados.push(hoja);
    }
    Ok(grados)
}
