//! Errores del generador de boletines.
//!
//! Los valores que no se pueden interpretar (campo de estudiante mal formado,
//! nota no numérica) NO son errores: se omiten y los componentes devuelven
//! `Option::None` o simplemente no los cuentan.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotadorError {
    /// Archivo de planilla o plantilla inexistente al configurar.
    #[error("El archivo {tipo} {} no existe", ruta.display())]
    NoEncontrado { tipo: &'static str, ruta: PathBuf },

    /// Falta una columna requerida, una hoja o la tabla de ÁREAS.
    #[error("{0}")]
    Validacion(String),

    #[error("No se encontró el estudiante con ID {id} en la hoja {grado}")]
    EstudianteNoEncontrado { id: String, grado: String },

    /// Ruta obligatoria sin establecer (planilla, plantilla o carpeta de salida).
    #[error("No se ha establecido {0}")]
    NoConfigurado(&'static str),

    /// Fallo abriendo, editando, guardando o exportando el documento.
    #[error("Fallo del motor de documentos: {0}")]
    Motor(String),

    #[error("Error leyendo la planilla: {0}")]
    Excel(#[from] calamine::Error),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Documento con ZIP inválido: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Documento con XML inválido: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotadorError {
    /// Clase del error tal como se informa en los resúmenes de lote.
    pub fn tipo(&self) -> &'static str {
        match self {
            NotadorError::NoEncontrado { .. } => "NotFound",
            NotadorError::Validacion(_) => "ValidationError",
            NotadorError::EstudianteNoEncontrado { .. } => "StudentNotFound",
            NotadorError::NoConfigurado(_) => "NotConfigured",
            NotadorError::Excel(_) | NotadorError::Json(_) => "ReadError",
            NotadorError::Motor(_)
            | NotadorError::Io(_)
            | NotadorError::Zip(_)
            | NotadorError::Xml(_) => "ExternalEngineFailure",
        }
    }
}

pub type Result<T> = std::result::Result<T, NotadorError>;
