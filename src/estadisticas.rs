//! Promedio y número de áreas perdidas de un estudiante.

use crate::models::{EstadisticasAcademicas, Fila};
use std::collections::HashSet;

/// Normaliza un nombre de columna: recorta, pasa a minúsculas y quita tildes.
///
/// Ejemplo: `normalize_name(" PERÍODO ") == normalize_name("periodo")`.
pub fn normalize_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().chars().flat_map(char::to_lowercase) {
        let c = match ch {
            'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ý' | 'ÿ' => 'y',
            'ñ' => 'n',
            'ç' => 'c',
            // marcas combinantes sueltas (texto en forma NFD)
            '\u{0300}'..='\u{036f}' => continue,
            other => other,
        };
        out.push(c);
    }
    out
}

/// Conjunto de nombres normalizados de columnas administrativas.
#[derive(Debug, Clone, Default)]
pub struct ColumnasAdministrativas {
    nombres: HashSet<String>,
}

impl ColumnasAdministrativas {
    pub fn new<I, S>(variantes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nombres = variantes
            .into_iter()
            .map(|v| normalize_name(v.as_ref()))
            .filter(|v| !v.is_empty())
            .collect();
        ColumnasAdministrativas { nombres }
    }

    /// `true` si la columna no es de notas: nombre vacío, variante
    /// administrativa, o duplicado con sufijo (`GRUPO.1`) de una de ellas.
    pub fn es_administrativa(&self, columna: &str) -> bool {
        let norm = normalize_name(columna);
        if norm.is_empty() || self.nombres.contains(&norm) {
            return true;
        }
        match sin_sufijo_duplicado(&norm) {
            Some(base) => self.nombres.contains(base),
            None => false,
        }
    }
}

/// `"grupo.1"` → `Some("grupo")`.
fn sin_sufijo_duplicado(nombre: &str) -> Option<&str> {
    let (base, sufijo) = nombre.rsplit_once('.')?;
    if !base.is_empty() && !sufijo.is_empty() && sufijo.chars().all(|c| c.is_ascii_digit()) {
        Some(base.trim_end())
    } else {
        None
    }
}

/// Interpreta una nota: recorta, admite coma decimal y exige un número finito.
pub fn parsear_nota(valor: &str) -> Option<f64> {
    let texto = valor.trim().replace(',', ".");
    if texto.is_empty() {
        return None;
    }
    texto.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Redondea a dos decimales; los empates van al par.
pub fn redondear_2(valor: f64) -> f64 {
    (valor * 100.0).round_ties_even() / 100.0
}

/// Calcula promedio y áreas perdidas recorriendo todas las columnas de la fila.
///
/// Se ignoran las columnas administrativas y los valores que no son números;
/// una nota estrictamente menor que `nota_minima` cuenta como perdida. Sin
/// notas válidas el promedio es 0.
pub fn calcular_estadisticas(
    fila: &Fila,
    admin: &ColumnasAdministrativas,
    nota_minima: f64,
) -> EstadisticasAcademicas {
    let mut notas: Vec<f64> = Vec::new();
    let mut materias_perdidas = 0usize;

    for (columna, valor) in fila.iter() {
        if admin.es_administrativa(columna) {
            tracing::trace!("Ignorando columna admin: '{}'", columna);
            continue;
        }
        let Some(nota) = parsear_nota(valor) else {
            tracing::trace!("Valor no numérico '{}' en columna '{}'", valor, columna);
            continue;
        };
        tracing::trace!("Añadiendo nota {} de columna '{}'", nota, columna);
        notas.push(nota);
        if nota < nota_minima {
            materias_perdidas += 1;
        }
    }

    let promedio = if notas.is_empty() {
        0.0
    } else {
        redondear_2(notas.iter().sum::<f64>() / notas.len() as f64)
    };
    tracing::debug!(
        "Resumen del cálculo: {} notas válidas, promedio {:.2}, perdidas {}",
        notas.len(),
        promedio,
        materias_perdidas
    );

    EstadisticasAcademicas { promedio, materias_perdidas }
}
