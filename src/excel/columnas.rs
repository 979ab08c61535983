//! Normalización de encabezados: cada columna conocida se renombra a su
//! nombre canónico (`estudiante`, `GRUPO`, `PERIODO`).

use crate::config::SinonimoColumna;
use crate::models::Fila;

/// Devuelve una fila con los encabezados conocidos renombrados.
///
/// Para cada nombre canónico:
/// 1. si la fila ya tiene la columna canónica, no se toca nada;
/// 2. si no, se renombra la primera variante presente según el orden
///    declarado en `sinonimos`;
/// 3. las demás variantes quedan con su nombre original.
///
/// Las comparaciones son exactas tras recortar espacios del encabezado, por
/// lo que aplicar la función dos veces da el mismo resultado.
pub fn normalizar_columnas(fila: &Fila, sinonimos: &[SinonimoColumna]) -> Fila {
    let mut salida: Fila = fila.iter().map(|(c, v)| (c.trim().to_string(), v.to_string())).collect();

    for sinonimo in sinonimos {
        if salida.contains(&sinonimo.canonica) {
            continue;
        }
        let encontrada = sinonimo
            .variantes
            .iter()
            .map(|v| v.trim())
            .find(|v| salida.contains(v))
            .map(str::to_string);
        if let Some(variante) = encontrada {
            salida.rename(&variante, &sinonimo.canonica);
        }
    }

    salida
}

/// Columnas requeridas que no aparecen entre `columnas`.
pub fn columnas_faltantes<'a>(columnas: &[String], requeridas: &[&'a str]) -> Vec<&'a str> {
    requeridas.iter().copied().filter(|r| !columnas.iter().any(|c| c == r)).collect()
}
