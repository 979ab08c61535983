//! Lectura del campo compuesto de estudiante: `"123456789 - APELLIDO1 APELLIDO2 NOMBRES"`.

use crate::models::IdentidadEstudiante;
use regex::Regex;
use std::sync::OnceLock;

static PATRON_ESTUDIANTE: OnceLock<Regex> = OnceLock::new();

fn patron() -> &'static Regex {
    PATRON_ESTUDIANTE.get_or_init(|| {
        Regex::new(r"^(\d{9})\s*-\s*(.+)").expect("el patrón de estudiante es una expresión válida")
    })
}

/// Extrae id, nombre completo, apellidos y nombres.
///
/// Devuelve `None` si el campo no empieza con 9 dígitos, guion y un nombre no
/// vacío. Quien llama debe tratar `None` como "fila omitida".
///
/// Los dos primeros tokens del nombre son los apellidos y el resto los
/// nombres; con menos de dos tokens todo el nombre queda como apellidos.
pub fn parsear_campo_estudiante(campo: &str) -> Option<IdentidadEstudiante> {
    let caps = patron().captures(campo)?;
    let id = caps.get(1)?.as_str().to_string();
    let nombre_completo = caps.get(2)?.as_str().trim().to_string();
    if nombre_completo.is_empty() {
        return None;
    }

    let partes: Vec<&str> = nombre_completo.split_whitespace().collect();
    let (apellidos, nombres) = if partes.len() >= 2 {
        (partes[..2].join(" "), partes[2..].join(" "))
    } else {
        (nombre_completo.clone(), String::new())
    };

    Some(IdentidadEstudiante { id, nombre_completo, apellidos, nombres })
}

/// Nombre apto para archivo: reemplaza separadores de ruta por `-`.
pub fn nombre_seguro(nombre_completo: &str) -> String {
    nombre_completo.replace(['/', '\\'], "-")
}
