//! Relleno de la plantilla: primero las etiquetas de campo, luego la tabla
//! de ÁREAS, y al final guardado nativo más exportación a PDF.

use super::{limpiar_texto_celda, DocumentoPlantilla, MotorDocumentos, PosicionCelda};
use crate::areas::MapeoAreas;
use crate::config::EtiquetasPlantilla;
use crate::error::{NotadorError, Result};
use crate::estadisticas::normalize_name;
use crate::models::{ArchivosBoletin, Fila};
use std::path::Path;

/// Valor que se escribe cuando el grupo o el período vienen vacíos.
pub const SIN_DATO: &str = "N/A";

/// Celda vecina donde va el valor de una etiqueta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destino {
    Derecha,
    Debajo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reemplazo {
    pub etiqueta: String,
    pub valor: String,
    pub destino: Destino,
}

/// Reemplazos en orden de aplicación.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reemplazos(Vec<Reemplazo>);

impl Reemplazos {
    pub fn push(&mut self, etiqueta: impl Into<String>, valor: impl Into<String>, destino: Destino) {
        self.0.push(Reemplazo { etiqueta: etiqueta.into(), valor: valor.into(), destino });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reemplazo> {
        self.0.iter()
    }

    /// Valor asociado a una etiqueta literal.
    pub fn valor(&self, etiqueta: &str) -> Option<&str> {
        self.0.iter().find(|r| r.etiqueta == etiqueta).map(|r| r.valor.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Datos de un estudiante listos para escribir en la plantilla.
#[derive(Debug, Clone, PartialEq)]
pub struct DatosBoletin {
    pub nombre_completo: String,
    pub id: String,
    pub grado: String,
    pub grupo: String,
    pub periodo: String,
    pub materias_perdidas: usize,
    pub promedio: f64,
}

fn o_sin_dato(valor: &str) -> String {
    let valor = valor.trim();
    if valor.is_empty() { SIN_DATO.to_string() } else { valor.to_string() }
}

/// Una entrada por cada variante de etiqueta. Nombre e ID van debajo de su
/// etiqueta; el resto a la derecha.
pub fn construir_reemplazos(etiquetas: &EtiquetasPlantilla, datos: &DatosBoletin) -> Reemplazos {
    let campos: [(&[String], String, Destino); 7] = [
        (etiquetas.nombre_completo.as_slice(), datos.nombre_completo.clone(), Destino::Debajo),
        (etiquetas.id.as_slice(), datos.id.clone(), Destino::Debajo),
        (etiquetas.grado.as_slice(), datos.grado.clone(), Destino::Derecha),
        (etiquetas.grupo.as_slice(), o_sin_dato(&datos.grupo), Destino::Derecha),
        (etiquetas.periodo.as_slice(), o_sin_dato(&datos.periodo), Destino::Derecha),
        (etiquetas.materias_perdidas.as_slice(), datos.materias_perdidas.to_string(), Destino::Derecha),
        (etiquetas.promedio.as_slice(), format!("{:.2}", datos.promedio), Destino::Derecha),
    ];

    let mut reemplazos = Reemplazos::default();
    for (variantes, valor, destino) in campos {
        for etiqueta in variantes {
            reemplazos.push(etiqueta.clone(), valor.clone(), destino);
        }
    }
    reemplazos
}

fn posiciones(doc: &dyn DocumentoPlantilla) -> Vec<PosicionCelda> {
    let mut todas = Vec::new();
    for t in 0..doc.num_tablas() {
        for f in 0..doc.num_filas(t) {
            for c in 0..doc.num_celdas(t, f) {
                todas.push(PosicionCelda::new(t, f, c));
            }
        }
    }
    todas
}

/// Escribe cada valor junto a las celdas cuyo texto limpio es exactamente la
/// etiqueta. Si la celda vecina no existe se omite. Devuelve cuántas celdas
/// se escribieron.
pub fn sustituir_campos(doc: &mut dyn DocumentoPlantilla, reemplazos: &Reemplazos) -> usize {
    let celdas = posiciones(doc);
    let mut escritas = 0;
    for r in reemplazos.iter() {
        for &pos in &celdas {
            let coincide = doc
                .texto_celda(pos)
                .is_some_and(|t| limpiar_texto_celda(&t) == r.etiqueta.as_str());
            if !coincide {
                continue;
            }
            let objetivo = match r.destino {
                Destino::Derecha => pos.derecha(),
                Destino::Debajo => pos.debajo(),
            };
            if doc.escribir_celda(objetivo, &r.valor) {
                escritas += 1;
            } else {
                tracing::debug!("Etiqueta '{}' sin celda vecina en {:?}", r.etiqueta, pos);
            }
        }
    }
    escritas
}

/// Valor de un área en la fila: por clave exacta o, si no está, por la única
/// columna cuyo nombre normalizado coincide con el de la clave.
pub fn valor_area<'a>(fila: &'a Fila, clave: &str) -> Option<&'a str> {
    if let Some(v) = fila.get(clave) {
        return Some(v);
    }
    let objetivo = normalize_name(clave);
    let mut candidatas = fila.iter().filter(|(c, _)| normalize_name(c) == objetivo);
    match (candidatas.next(), candidatas.next()) {
        (Some((_, v)), None) => Some(v),
        _ => None,
    }
}

/// Primera tabla con una celda cuyo texto limpio es `titulo`.
fn buscar_tabla_areas(doc: &dyn DocumentoPlantilla, titulo: &str) -> Option<usize> {
    posiciones(doc)
        .into_iter()
        .find(|&pos| doc.texto_celda(pos).is_some_and(|t| limpiar_texto_celda(&t) == titulo))
        .map(|pos| pos.tabla)
}

/// Rellena la segunda columna de la tabla de ÁREAS con las notas de la fila.
///
/// En cada fila de la tabla gana la primera entrada del mapeo cuyo texto está
/// contenido (sin distinguir mayúsculas) en la primera celda. Si la clave de
/// esa entrada no está en la fila del estudiante la celda queda igual.
/// Sin tabla de ÁREAS en el documento devuelve `Validacion`.
pub fn sustituir_areas(
    doc: &mut dyn DocumentoPlantilla,
    fila: &Fila,
    mapeo: &MapeoAreas,
    titulo: &str,
) -> Result<usize> {
    let tabla = buscar_tabla_areas(doc, titulo).ok_or_else(|| {
        NotadorError::Validacion(format!("No se encontró la tabla de {} en la plantilla", titulo))
    })?;

    let mut escritas = 0;
    for f in 0..doc.num_filas(tabla) {
        let Some(etiqueta) = doc.texto_celda(PosicionCelda::new(tabla, f, 0)) else {
            continue;
        };
        let etiqueta = limpiar_texto_celda(&etiqueta).to_uppercase();
        let Some(entrada) = mapeo.iter().find(|e| etiqueta.contains(&e.etiqueta.to_uppercase())) else {
            continue;
        };
        match valor_area(fila, &entrada.clave) {
            Some(valor) => {
                if doc.escribir_celda(PosicionCelda::new(tabla, f, 1), valor.trim()) {
                    escritas += 1;
                }
            }
            None => tracing::debug!("Área '{}' sin columna en la planilla", entrada.clave),
        }
    }
    Ok(escritas)
}

/// Abre la plantilla, aplica ambos pasos y escribe el documento y el PDF.
///
/// La sesión del motor se libera al salir, falle o no. Si la exportación a
/// PDF falla se borra el documento ya guardado, de modo que no quedan
/// boletines a medias.
#[allow(clippy::too_many_arguments)]
pub fn rellenar_documento(
    motor: &dyn MotorDocumentos,
    plantilla: &Path,
    rutas: &ArchivosBoletin,
    reemplazos: &Reemplazos,
    fila: &Fila,
    mapeo: &MapeoAreas,
    titulo_areas: &str,
    progreso: &mut dyn FnMut(&str),
) -> Result<ArchivosBoletin> {
    let mut sesion = motor.abrir(plantilla)?;

    progreso("Aplicando información básica...");
    let campos = sustituir_campos(sesion.documento(), reemplazos);
    let areas = sustituir_areas(sesion.documento(), fila, mapeo, titulo_areas)?;
    tracing::debug!("Celdas escritas: {} campos, {} áreas", campos, areas);

    if let Err(e) = sesion.guardar(&rutas.documento) {
        let _ = std::fs::remove_file(&rutas.documento);
        return Err(e);
    }
    progreso("💾 Guardando versión PDF...");
    if let Err(e) = sesion.exportar_pdf(&rutas.pdf) {
        let _ = std::fs::remove_file(&rutas.documento);
        let _ = std::fs::remove_file(&rutas.pdf);
        return Err(e);
    }
    Ok(rutas.clone())
}
