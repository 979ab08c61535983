// Estructuras de datos principales

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::PathBuf;

/// Fila de una hoja: pares columna → valor en el orden de la planilla.
/// Las columnas son únicas dentro de una fila.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fila {
    celdas: Vec<(String, String)>,
}

impl Fila {
    pub fn new() -> Self {
        Fila { celdas: Vec::new() }
    }

    /// Valor de la columna (coincidencia exacta).
    pub fn get(&self, columna: &str) -> Option<&str> {
        self.celdas.iter().find(|(c, _)| c == columna).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, columna: &str) -> bool {
        self.celdas.iter().any(|(c, _)| c == columna)
    }

    /// Inserta o sustituye el valor de una columna, conservando su posición.
    pub fn insert(&mut self, columna: impl Into<String>, valor: impl Into<String>) {
        let columna = columna.into();
        let valor = valor.into();
        match self.celdas.iter_mut().find(|(c, _)| *c == columna) {
            Some((_, v)) => *v = valor,
            None => self.celdas.push((columna, valor)),
        }
    }

    /// Renombra una columna en su misma posición. Devuelve `false` si no
    /// existe o si el nombre nuevo ya está ocupado por otra columna.
    pub fn rename(&mut self, de: &str, a: &str) -> bool {
        if de == a {
            return self.contains(de);
        }
        if self.contains(a) {
            return false;
        }
        match self.celdas.iter_mut().find(|(c, _)| c == de) {
            Some((c, _)) => {
                *c = a.to_string();
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.celdas.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn columnas(&self) -> impl Iterator<Item = &str> {
        self.celdas.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.celdas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.celdas.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fila {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fila = Fila::new();
        for (k, v) in iter {
            fila.insert(k, v);
        }
        fila
    }
}

impl Serialize for Fila {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.celdas.len()))?;
        for (c, v) in &self.celdas {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

/// Hoja de un grado ya leída: columnas normalizadas y filas de datos.
#[derive(Debug, Clone, PartialEq)]
pub struct Hoja {
    pub nombre: String,
    pub columnas: Vec<String>,
    pub filas: Vec<Fila>,
}

/// Identidad extraída del campo compuesto "ID - APELLIDOS NOMBRES".
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IdentidadEstudiante {
    pub id: String,
    pub nombre_completo: String,
    pub apellidos: String,
    pub nombres: String,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EstadisticasAcademicas {
    /// Promedio redondeado a 2 decimales (0 si no hay notas).
    pub promedio: f64,
    pub materias_perdidas: usize,
}

/// Estudiante tal como se lista para un grado.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResumenEstudiante {
    pub id: String,
    pub nombre: String,
    pub grupo: String,
}

/// Rutas de los dos archivos generados para un estudiante.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArchivosBoletin {
    pub documento: PathBuf,
    pub pdf: PathBuf,
}

/// Estudiante de un lote que no se pudo procesar.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FallaLote {
    /// Texto del campo `estudiante` (o el ID solicitado).
    pub estudiante: String,
    pub tipo: String,
    pub motivo: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResumenLote {
    pub grado: String,
    pub generado_en: chrono::DateTime<chrono::Local>,
    pub generados: Vec<ArchivosBoletin>,
    pub fallas: Vec<FallaLote>,
}

impl ResumenLote {
    pub fn new(grado: &str) -> Self {
        ResumenLote {
            grado: grado.to_string(),
            generado_en: chrono::Local::now(),
            generados: Vec::new(),
            fallas: Vec::new(),
        }
    }
}
