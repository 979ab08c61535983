use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;

use crate::config::SinonimoColumna;
use crate::error::{NotadorError, Result};
use crate::excel::columnas::normalizar_columnas;
use crate::models::{Fila, Hoja};

/// Convierte un `Data` de calamine a String. Los enteros guardados como
/// flotante se escriben sin `.0` y las celdas vacías quedan como "".
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.is_finite() && (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Nombres de las hojas del libro, en el orden que reporta calamine.
pub fn nombres_hojas<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names().to_owned())
}

/// Encabezados limpios de la primera fila. Los vacíos quedan como `None`
/// (la columna se descarta) y los repetidos reciben sufijo `.1`, `.2`, …
pub fn encabezados_unicos(primera_fila: &[Data]) -> Vec<Option<String>> {
    let mut vistos: HashMap<String, usize> = HashMap::new();
    let mut salida = Vec::with_capacity(primera_fila.len());
    for celda in primera_fila {
        let texto = cell_to_string(celda).trim().to_string();
        if texto.is_empty() {
            salida.push(None);
            continue;
        }
        let mut nombre = texto.clone();
        if let Some(n) = vistos.get(&texto).copied() {
            let mut sufijo = n;
            loop {
                let candidato = format!("{}.{}", texto, sufijo);
                if !vistos.contains_key(&candidato) {
                    nombre = candidato;
                    break;
                }
                sufijo += 1;
            }
            vistos.insert(texto.clone(), sufijo + 1);
        } else {
            vistos.insert(texto.clone(), 1);
        }
        if nombre != texto {
            vistos.insert(nombre.clone(), 1);
        }
        salida.push(Some(nombre));
    }
    salida
}

/// Lee una hoja como filas con nombre de columna ya normalizado.
///
/// La primera fila del rango usado es el encabezado. Las celdas vacías
/// quedan como cadenas vacías y las filas completamente vacías se omiten.
pub fn leer_hoja<P: AsRef<Path>>(
    path: P,
    hoja: &str,
    sinonimos: &[SinonimoColumna],
) -> Result<Hoja> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_owned();
    if !names.iter().any(|s| s == hoja) {
        return Err(NotadorError::Validacion(format!(
            "La hoja '{}' no existe en {}",
            hoja,
            path.display()
        )));
    }

    let range = workbook.worksheet_range(hoja)?;
    let mut rows_iter = range.rows();
    let encabezados = match rows_iter.next() {
        Some(header_row) => encabezados_unicos(header_row),
        None => {
            return Ok(Hoja { nombre: hoja.to_string(), columnas: Vec::new(), filas: Vec::new() });
        }
    };
    let plantilla: Fila = encabezados.iter().flatten().map(|h| (h.clone(), String::new())).collect();
    let columnas: Vec<String> =
        normalizar_columnas(&plantilla, sinonimos).columnas().map(str::to_string).collect();

    let mut filas = Vec::new();
    for row in rows_iter {
        let valores: Vec<String> = (0..encabezados.len())
            .map(|i| row.get(i).map(cell_to_string).unwrap_or_default())
            .collect();
        if valores.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let fila: Fila = encabezados
            .iter()
            .zip(valores)
            .filter_map(|(h, v)| h.as_ref().map(|h| (h.clone(), v)))
            .collect();
        filas.push(normalizar_columnas(&fila, sinonimos));
    }

    tracing::debug!("📖 Hoja '{}': {} filas leídas", hoja, filas.len());
    Ok(Hoja { nombre: hoja.to_string(), columnas, filas })
}
