//! Mapeo de áreas: clave de la planilla → texto de la tabla de ÁREAS del Word.

use crate::config::{EntradaArea, ExclusionGrado};
use crate::estadisticas::{normalize_name, ColumnasAdministrativas};
use serde::Serialize;

/// Mapeo ordenado de áreas. El orden importa: en cada fila de la tabla de
/// ÁREAS gana la primera entrada cuyo texto aparece en la etiqueta.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapeoAreas {
    entradas: Vec<EntradaArea>,
}

impl MapeoAreas {
    pub fn new(entradas: Vec<EntradaArea>) -> Self {
        MapeoAreas { entradas }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntradaArea> {
        self.entradas.iter()
    }

    pub fn contains_key(&self, clave: &str) -> bool {
        self.entradas.iter().any(|e| e.clave == clave)
    }

    pub fn etiqueta(&self, clave: &str) -> Option<&str> {
        self.entradas.iter().find(|e| e.clave == clave).map(|e| e.etiqueta.as_str())
    }

    pub fn len(&self) -> usize {
        self.entradas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entradas.is_empty()
    }
}

impl From<&[EntradaArea]> for MapeoAreas {
    fn from(entradas: &[EntradaArea]) -> Self {
        MapeoAreas::new(entradas.to_vec())
    }
}

/// Construye el mapeo para un documento a partir del mapeo base.
///
/// `grado` se interpreta como entero tras recortar espacios; si coincide con
/// alguna exclusión se quitan esas áreas. Si no es un entero se devuelve el
/// mapeo base sin cambios. El mapeo base nunca se modifica.
pub fn construir_mapeo_areas(
    base: &MapeoAreas,
    grado: &str,
    exclusiones: &[ExclusionGrado],
) -> MapeoAreas {
    let Ok(numero) = grado.trim().parse::<i64>() else {
        return base.clone();
    };
    let excluidas: Vec<&str> = exclusiones
        .iter()
        .filter(|e| e.grado == numero)
        .flat_map(|e| e.areas.iter().map(String::as_str))
        .collect();
    if excluidas.is_empty() {
        return base.clone();
    }
    tracing::debug!("Grado {}: se excluyen las áreas {:?}", numero, excluidas);
    MapeoAreas::new(
        base.entradas.iter().filter(|e| !excluidas.contains(&e.clave.as_str())).cloned().collect(),
    )
}

/// Umbral de similitud para sugerir una clave de área.
const SIMILITUD_MINIMA: f64 = 0.6;

/// Columna de notas sin entrada en el mapeo, con la clave más parecida.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnaSinMapeo {
    pub columna: String,
    pub sugerencia: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DiagnosticoAreas {
    /// Claves del mapeo presentes en la hoja.
    pub mapeadas: Vec<String>,
    /// Columnas de notas de la hoja que el mapeo no conoce.
    pub sin_mapeo: Vec<ColumnaSinMapeo>,
    /// Claves del mapeo que no aparecen como columna.
    pub sin_columna: Vec<String>,
    /// Etiquetas del mapeo que no aparecen en la plantilla.
    pub ausentes_en_plantilla: Vec<String>,
}

/// Compara las columnas de una hoja y los textos de la plantilla contra el mapeo.
pub fn diagnosticar_areas(
    columnas: &[String],
    textos_plantilla: &[String],
    mapeo: &MapeoAreas,
    admin: &ColumnasAdministrativas,
) -> DiagnosticoAreas {
    let mut diag = DiagnosticoAreas::default();

    for columna in columnas.iter().filter(|c| !admin.es_administrativa(c)) {
        if mapeo.contains_key(columna) {
            diag.mapeadas.push(columna.clone());
            continue;
        }
        let norm = normalize_name(columna);
        let sugerencia = mapeo
            .iter()
            .map(|e| (strsim::normalized_levenshtein(&norm, &normalize_name(&e.clave)), &e.clave))
            .filter(|(sim, _)| *sim >= SIMILITUD_MINIMA)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, clave)| clave.clone());
        diag.sin_mapeo.push(ColumnaSinMapeo { columna: columna.clone(), sugerencia });
    }

    for entrada in mapeo.iter() {
        if !columnas.iter().any(|c| *c == entrada.clave) {
            diag.sin_columna.push(entrada.clave.clone());
        }
        let etiqueta = entrada.etiqueta.to_uppercase();
        if !textos_plantilla.iter().any(|t| t.to_uppercase().contains(&etiqueta)) {
            diag.ausentes_en_plantilla.push(entrada.etiqueta.clone());
        }
    }

    diag
}
