//! Tablas de mapeo y configuración de ejecución.
//!
//! `TablasMapeo` reúne los sinónimos de columnas, las columnas
//! administrativas, la tabla de áreas y las etiquetas de la plantilla. Se
//! construye una sola vez (por defecto o desde un JSON) y se pasa
//! explícitamente a cada componente.
//!
//! `Configuracion` se lee del entorno, cargando antes un `.env` si existe:
//! - `NOTADOR_TABLAS`: JSON con tablas que sustituyen a las de fábrica
//! - `NOTADOR_SOFFICE`: ejecutable de LibreOffice para exportar a PDF
//! - `NOTADOR_ESPERA_PDF_SEGUNDOS`: espera máxima de la conversión
//! - `NOTADOR_BIND`: dirección del servidor HTTP

use crate::error::{NotadorError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Nombre canónico de una columna y las variantes aceptadas, en orden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinonimoColumna {
    pub canonica: String,
    pub variantes: Vec<String>,
}

/// Área: clave de la planilla → texto exacto en la tabla de ÁREAS del Word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntradaArea {
    pub clave: String,
    pub etiqueta: String,
}

/// Áreas que no aparecen en los boletines de un grado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExclusionGrado {
    pub grado: i64,
    pub areas: Vec<String>,
}

/// Textos literales de las etiquetas de la plantilla, por campo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtiquetasPlantilla {
    pub periodo: Vec<String>,
    pub grado: Vec<String>,
    pub grupo: Vec<String>,
    pub nombre_completo: Vec<String>,
    pub id: Vec<String>,
    pub materias_perdidas: Vec<String>,
    pub promedio: Vec<String>,
}

impl Default for EtiquetasPlantilla {
    fn default() -> Self {
        EtiquetasPlantilla {
            periodo: textos(&["PERÍODO"]),
            grado: textos(&["GRADO"]),
            grupo: textos(&["GRUPO"]),
            nombre_completo: textos(&["NOMBRE Y APELLIDOS COMPLETOS DEL ESTUDIANTE:"]),
            id: textos(&["ID INSTITUCIONAL"]),
            materias_perdidas: textos(&["Número de áreas o asignaturas con nota no aprobatoria"]),
            promedio: textos(&["Promedio Académico"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TablasMapeo {
    pub sinonimos_columnas: Vec<SinonimoColumna>,
    pub columnas_administrativas: Vec<String>,
    pub areas: Vec<EntradaArea>,
    pub exclusiones_por_grado: Vec<ExclusionGrado>,
    pub etiquetas: EtiquetasPlantilla,
    /// Texto de la celda que identifica la tabla de áreas.
    pub titulo_tabla_areas: String,
    /// Nota mínima aprobatoria (estrictamente menor = perdida).
    pub nota_minima: f64,
    /// Hoja que no corresponde a un grado.
    pub hoja_consolidado: String,
}

impl Default for TablasMapeo {
    fn default() -> Self {
        TablasMapeo {
            sinonimos_columnas: vec![
                sinonimo("GRUPO", &["GRUPO", "grupo", "Group", "group", "GRUPO.1", "Grupo.1"]),
                sinonimo("PERIODO", &["PERIODO", "periodo", "PERÍODO", "período", "PERIODO.1"]),
                sinonimo(
                    "estudiante",
                    &["estudiante", "ESTUDIANTE", "Estudiante", "NOMBRE", "NOMBRES Y APELLIDOS"],
                ),
            ],
            columnas_administrativas: textos(&[
                "estudiante",
                "ESTUDIANTE",
                "GRUPO",
                "grupo",
                "PERIODO",
                "periodo",
                "PERÍODO",
                "Promedio",
                "PROMEDIO",
                "promedio",
                "Mención de honor",
                "MENCION DE HONOR",
                "OBSERVACIONES",
                "observaciones",
                "GRADO",
                "grado",
                "Areas deficitadas",
                "AREAS DEFICITADAS",
                "Áreas deficitadas",
                "areas deficitadas",
                "Areas perdidas",
                "AREAS PERDIDAS",
            ]),
            areas: vec![
                area("Investigación", "Introducción a la investigación Formativa"),
                area("Ciencias Naturales", "Ciencias Naturales y Educación Ambiental"),
                area(
                    "Ciencias Sociales",
                    "Ciencias Sociales, Historia, Geografía, Constitución Política y Democracia",
                ),
                area("Educ, Artística", "Educación Artística y Cultural"),
                area("Edu, Ética", "Educación Ética y en Valores Humanos"),
                area("Edu, física", "Educación Física, Recreación y Deportes"),
                area("Edu, Religiosa", "Educación Religiosa"),
                area("Lengua Castellana", "Humanidades, Lengua Castellana"),
                area("Matemáticas", "Matemáticas"),
                area("Tecnología e informatica", "Tecnología e Informática"),
                area("Inglés", "Humanidades, idioma extranjero (inglés)"),
            ],
            exclusiones_por_grado: vec![ExclusionGrado {
                grado: 8,
                areas: textos(&["Investigación"]),
            }],
            etiquetas: EtiquetasPlantilla::default(),
            titulo_tabla_areas: "ÁREAS".to_string(),
            nota_minima: 3.5,
            hoja_consolidado: "consolidado".to_string(),
        }
    }
}

impl TablasMapeo {
    /// Lee tablas desde un JSON. Los campos ausentes toman el valor de fábrica.
    pub fn cargar<P: AsRef<Path>>(ruta: P) -> Result<Self> {
        let ruta = ruta.as_ref();
        if !ruta.exists() {
            return Err(NotadorError::NoEncontrado { tipo: "de tablas", ruta: ruta.to_path_buf() });
        }
        let texto = std::fs::read_to_string(ruta)?;
        let tablas: TablasMapeo = serde_json::from_str(&texto)?;
        tracing::info!("📖 Tablas de mapeo cargadas desde {}", ruta.display());
        Ok(tablas)
    }

    /// `true` si la hoja es la pestaña consolidado (ignora mayúsculas y espacios).
    pub fn es_hoja_consolidado(&self, hoja: &str) -> bool {
        hoja.trim().to_lowercase() == self.hoja_consolidado.trim().to_lowercase()
    }
}

pub const BIND_POR_DEFECTO: &str = "127.0.0.1:8080";
const ESPERA_PDF_POR_DEFECTO: u64 = 120;

/// Configuración completa de una ejecución.
#[derive(Debug, Clone)]
pub struct Configuracion {
    pub tablas: TablasMapeo,
    pub soffice: PathBuf,
    pub espera_pdf: Duration,
    pub bind: String,
}

impl Default for Configuracion {
    fn default() -> Self {
        Configuracion {
            tablas: TablasMapeo::default(),
            soffice: PathBuf::from("soffice"),
            espera_pdf: Duration::from_secs(ESPERA_PDF_POR_DEFECTO),
            bind: BIND_POR_DEFECTO.to_string(),
        }
    }
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

impl Configuracion {
    pub fn desde_entorno() -> Result<Self> {
        load_dotenv();
        let mut config = Configuracion::default();

        if let Ok(ruta) = env::var("NOTADOR_TABLAS") {
            if !ruta.trim().is_empty() {
                config.tablas = TablasMapeo::cargar(ruta.trim())?;
            }
        }
        if let Ok(soffice) = env::var("NOTADOR_SOFFICE") {
            if !soffice.trim().is_empty() {
                config.soffice = PathBuf::from(soffice.trim());
            }
        }
        if let Ok(segundos) = env::var("NOTADOR_ESPERA_PDF_SEGUNDOS") {
            match segundos.trim().parse::<u64>() {
                Ok(s) if s > 0 => config.espera_pdf = Duration::from_secs(s),
                _ => tracing::warn!(
                    "⚠️ NOTADOR_ESPERA_PDF_SEGUNDOS inválido ('{}'), se usan {} s",
                    segundos,
                    ESPERA_PDF_POR_DEFECTO
                ),
            }
        }
        if let Ok(bind) = env::var("NOTADOR_BIND") {
            if !bind.trim().is_empty() {
                config.bind = bind.trim().to_string();
            }
        }
        Ok(config)
    }
}

fn textos(valores: &[&str]) -> Vec<String> {
    valores.iter().map(|s| s.to_string()).collect()
}

fn sinonimo(canonica: &str, variantes: &[&str]) -> SinonimoColumna {
    SinonimoColumna { canonica: canonica.to_string(), variantes: textos(variantes) }
}

fn area(clave: &str, etiqueta: &str) -> EntradaArea {
    EntradaArea { clave: clave.to_string(), etiqueta: etiqueta.to_string() }
}
