//! Módulo `documento`: modelo de plantilla y motor de documentos.
//!
//! El relleno trabaja contra el trait `DocumentoPlantilla` (tablas de celdas
//! con texto legible y escribible, más los párrafos sueltos). El adaptador
//! concreto es DOCX (`docx`), con exportación a PDF por LibreOffice (`pdf`).
//!
//! Una sesión abierta con `MotorDocumentos::abrir` se libera al soltarse,
//! tanto si el relleno termina bien como si falla.

/// Adaptador DOCX (OOXML) sobre zip + quick-xml
pub mod docx;

/// Conversión a PDF
pub mod pdf;

/// Sustitución de campos y de la tabla de áreas
pub mod rellenar;

pub use docx::{DocumentoDocx, MotorDocx};
pub use pdf::{ConvertidorPdf, LibreOffice};
pub use rellenar::{
    construir_reemplazos, rellenar_documento, sustituir_areas, sustituir_campos, DatosBoletin,
    Destino, Reemplazo, Reemplazos,
};

use crate::error::Result;
use std::path::Path;

/// Celda de una tabla de primer nivel del documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosicionCelda {
    pub tabla: usize,
    pub fila: usize,
    pub columna: usize,
}

impl PosicionCelda {
    pub fn new(tabla: usize, fila: usize, columna: usize) -> Self {
        PosicionCelda { tabla, fila, columna }
    }

    pub fn derecha(self) -> Self {
        PosicionCelda { columna: self.columna + 1, ..self }
    }

    pub fn debajo(self) -> Self {
        PosicionCelda { fila: self.fila + 1, ..self }
    }
}

/// Documento de plantilla visto como rejilla de celdas.
///
/// Las posiciones fuera de rango no son error: la lectura devuelve `None` y
/// la escritura devuelve `false`.
pub trait DocumentoPlantilla {
    fn num_tablas(&self) -> usize;
    fn num_filas(&self, tabla: usize) -> usize;
    fn num_celdas(&self, tabla: usize, fila: usize) -> usize;
    fn texto_celda(&self, pos: PosicionCelda) -> Option<String>;
    fn escribir_celda(&mut self, pos: PosicionCelda, texto: &str) -> bool;
    /// Textos de los párrafos que no están dentro de una tabla.
    fn textos_parrafos(&self) -> Vec<String>;
}

/// Documento abierto en el motor. Se libera al soltarse.
pub trait SesionDocumento {
    fn documento(&mut self) -> &mut dyn DocumentoPlantilla;
    fn guardar(&mut self, destino: &Path) -> Result<()>;
    fn exportar_pdf(&mut self, destino: &Path) -> Result<()>;
}

pub trait MotorDocumentos {
    fn abrir(&self, plantilla: &Path) -> Result<Box<dyn SesionDocumento + '_>>;
}

/// Texto de celda comparable: sin marcas de fin de celda (`\r`, `\x07`) ni
/// espacios en los extremos.
pub fn limpiar_texto_celda(texto: &str) -> &str {
    texto.trim_end_matches(|c: char| c.is_control() || c.is_whitespace()).trim()
}

/// Todos los textos visibles del documento: celdas de todas las tablas y
/// párrafos sueltos, ya limpios y sin vacíos.
pub fn textos_documento(doc: &dyn DocumentoPlantilla) -> Vec<String> {
    let mut textos = Vec::new();
    for t in 0..doc.num_tablas() {
        for f in 0..doc.num_filas(t) {
            for c in 0..doc.num_celdas(t, f) {
                if let Some(texto) = doc.texto_celda(PosicionCelda::new(t, f, c)) {
                    let limpio = limpiar_texto_celda(&texto);
                    if !limpio.is_empty() {
                        textos.push(limpio.to_string());
                    }
                }
            }
        }
    }
    textos.extend(
        doc.textos_parrafos()
            .iter()
            .map(|p| limpiar_texto_celda(p).to_string())
            .filter(|p| !p.is_empty()),
    );
    textos
}
