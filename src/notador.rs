//! Orquestación: planilla + plantilla + carpeta de salida → boletines.
//!
//! `Notador` guarda las tres rutas y las tablas de mapeo. Cada boletín se
//! genera de forma síncrona y abre su propia sesión del motor de documentos.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::areas::{construir_mapeo_areas, diagnosticar_areas, DiagnosticoAreas, MapeoAreas};
use crate::config::{Configuracion, TablasMapeo};
use crate::documento::{
    construir_reemplazos, rellenar_documento, textos_documento, DatosBoletin, LibreOffice,
    MotorDocumentos, MotorDocx,
};
use crate::error::{NotadorError, Result};
use crate::estadisticas::{calcular_estadisticas, ColumnasAdministrativas};
use crate::excel::{columnas_faltantes, leer_hoja, listar_grados, COLUMNA_ESTUDIANTE, COLUMNA_GRUPO, COLUMNA_PERIODO};
use crate::identidad::{nombre_seguro, parsear_campo_estudiante};
use crate::models::{
    ArchivosBoletin, FallaLote, Fila, Hoja, IdentidadEstudiante, ResumenEstudiante, ResumenLote,
};

/// Valor por defecto de grupo y período.
const SIN_DATO: &str = "N/A";

/// Hitos que se informan al generar un boletín.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hito {
    CargandoDatos,
    LocalizandoEstudiante,
    PreparandoInformacion,
    PreparandoArchivo,
    CalculandoEstadisticas,
    PreparandoDatos,
    GenerandoDocumento,
    Completado,
}

impl Hito {
    pub fn mensaje(self) -> &'static str {
        match self {
            Hito::CargandoDatos => "⌛ Cargando datos del estudiante (20%)",
            Hito::LocalizandoEstudiante => "🔍 Localizando información del estudiante (40%)",
            Hito::PreparandoInformacion => "📋 Preparando la información (60%)",
            Hito::PreparandoArchivo => "📝 Preparando archivo del boletín (70%)",
            Hito::CalculandoEstadisticas => "📊 Calculando estadísticas académicas (75%)",
            Hito::PreparandoDatos => "✍ Preparando datos del estudiante (80%)",
            Hito::GenerandoDocumento => "📄 Generando boletín (90%)",
            Hito::Completado => "✅ Boletín completado (100%)",
        }
    }
}

impl fmt::Display for Hito {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mensaje())
    }
}

/// Primer valor no vacío (recortado) o `N/A`.
fn primero_no_vacio(opciones: &[Option<&str>]) -> String {
    opciones
        .iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or(SIN_DATO)
        .to_string()
}

/// Contexto de un boletín ya resuelto.
struct Contexto<'a> {
    plantilla: &'a Path,
    salida: &'a Path,
    grado: &'a str,
    grupo: String,
    periodo: String,
}

pub struct Notador<M: MotorDocumentos> {
    motor: M,
    tablas: TablasMapeo,
    admin: ColumnasAdministrativas,
    mapeo_base: MapeoAreas,
    excel: Option<PathBuf>,
    plantilla: Option<PathBuf>,
    salida: Option<PathBuf>,
}

impl Notador<MotorDocx<LibreOffice>> {
    /// Notador con el motor DOCX y la conversión a PDF configurada.
    pub fn desde_configuracion(config: &Configuracion) -> Self {
        let convertidor = LibreOffice::new(config.soffice.clone(), config.espera_pdf);
        Notador::new(MotorDocx::new(convertidor), config.tablas.clone())
    }
}

impl<M: MotorDocumentos> Notador<M> {
    pub fn new(motor: M, tablas: TablasMapeo) -> Self {
        let admin = ColumnasAdministrativas::new(&tablas.columnas_administrativas);
        let mapeo_base = MapeoAreas::from(tablas.areas.as_slice());
        Notador { motor, tablas, admin, mapeo_base, excel: None, plantilla: None, salida: None }
    }

    pub fn tablas(&self) -> &TablasMapeo {
        &self.tablas
    }

    pub fn set_excel_file<P: AsRef<Path>>(&mut self, ruta: P) -> Result<()> {
        let ruta = ruta.as_ref();
        if !ruta.exists() {
            return Err(NotadorError::NoEncontrado { tipo: "Excel", ruta: ruta.to_path_buf() });
        }
        self.excel = Some(ruta.to_path_buf());
        tracing::info!("📖 Planilla: {}", ruta.display());
        Ok(())
    }

    pub fn set_word_template<P: AsRef<Path>>(&mut self, ruta: P) -> Result<()> {
        let ruta = ruta.as_ref();
        if !ruta.exists() {
            return Err(NotadorError::NoEncontrado { tipo: "de plantilla", ruta: ruta.to_path_buf() });
        }
        self.plantilla = Some(ruta.to_path_buf());
        tracing::info!("📖 Plantilla: {}", ruta.display());
        Ok(())
    }

    /// La carpeta se crea al generar el primer boletín si no existe.
    pub fn set_output_folder<P: AsRef<Path>>(&mut self, ruta: P) {
        self.salida = Some(ruta.as_ref().to_path_buf());
    }

    fn excel(&self) -> Result<&Path> {
        self.excel.as_deref().ok_or(NotadorError::NoConfigurado("el archivo Excel"))
    }

    fn plantilla(&self) -> Result<&Path> {
        self.plantilla.as_deref().ok_or(NotadorError::NoConfigurado("la plantilla Word"))
    }

    fn salida(&self) -> Result<&Path> {
        self.salida.as_deref().ok_or(NotadorError::NoConfigurado("la carpeta de salida"))
    }

    /// Hojas de grado de la planilla.
    pub fn grados(&self) -> Result<Vec<String>> {
        listar_grados(self.excel()?, &self.tablas)
    }

    /// Lee la hoja de un grado y exige la columna `estudiante`.
    pub fn leer_grado(&self, grado: &str) -> Result<Hoja> {
        let hoja = leer_hoja(self.excel()?, grado, &self.tablas.sinonimos_columnas)?;
        let faltantes = columnas_faltantes(&hoja.columnas, &[COLUMNA_ESTUDIANTE]);
        if !faltantes.is_empty() {
            return Err(NotadorError::Validacion(format!(
                "Faltan columnas requeridas en la hoja {}: {}",
                grado,
                faltantes.join(", ")
            )));
        }
        Ok(hoja)
    }

    /// Estudiantes del grado en orden de la planilla. Se omiten los campos
    /// vacíos o mal formados.
    pub fn estudiantes(&self, grado: &str) -> Result<Vec<ResumenEstudiante>> {
        let hoja = self.leer_grado(grado)?;
        let lista = hoja
            .filas
            .iter()
            .filter_map(|fila| {
                let identidad = parsear_campo_estudiante(fila.get(COLUMNA_ESTUDIANTE)?)?;
                Some(ResumenEstudiante {
                    id: identidad.id,
                    nombre: identidad.nombre_completo,
                    grupo: primero_no_vacio(&[fila.get(COLUMNA_GRUPO)]),
                })
            })
            .collect();
        Ok(lista)
    }

    /// Genera el boletín de un estudiante.
    ///
    /// `grupo` y `periodo` vacíos o ausentes se toman de la fila del
    /// estudiante y, si tampoco están, quedan como `N/A`.
    pub fn procesar_estudiante(
        &self,
        id: &str,
        grado: &str,
        grupo: Option<&str>,
        periodo: Option<&str>,
        progreso: Option<&mut dyn FnMut(&str)>,
    ) -> Result<ArchivosBoletin> {
        let mut sin_progreso = |_: &str| {};
        let progreso: &mut dyn FnMut(&str) = match progreso {
            Some(p) => p,
            None => &mut sin_progreso,
        };

        let resultado = self.procesar_estudiante_con(id, grado, grupo, periodo, &mut *progreso);
        if let Err(e) = &resultado {
            progreso(&format!("❌ Error: {}", e));
        }
        resultado
    }

    fn procesar_estudiante_con(
        &self,
        id: &str,
        grado: &str,
        grupo: Option<&str>,
        periodo: Option<&str>,
        progreso: &mut dyn FnMut(&str),
    ) -> Result<ArchivosBoletin> {
        let plantilla = self.plantilla()?;
        let salida = self.salida()?;

        progreso(Hito::CargandoDatos.mensaje());
        let hoja = self.leer_grado(grado)?;

        progreso(Hito::LocalizandoEstudiante.mensaje());
        let id = id.trim();
        let (fila, identidad) = hoja
            .filas
            .iter()
            .find_map(|fila| {
                let identidad = parsear_campo_estudiante(fila.get(COLUMNA_ESTUDIANTE)?)?;
                (identidad.id == id).then_some((fila, identidad))
            })
            .ok_or_else(|| NotadorError::EstudianteNoEncontrado {
                id: id.to_string(),
                grado: grado.to_string(),
            })?;

        progreso(Hito::PreparandoInformacion.mensaje());
        let ctx = Contexto {
            plantilla,
            salida,
            grado,
            grupo: primero_no_vacio(&[grupo, fila.get(COLUMNA_GRUPO)]),
            periodo: primero_no_vacio(&[periodo, fila.get(COLUMNA_PERIODO)]),
        };
        self.generar(fila, &identidad, &ctx, progreso)
    }

    fn generar(
        &self,
        fila: &Fila,
        identidad: &IdentidadEstudiante,
        ctx: &Contexto<'_>,
        progreso: &mut dyn FnMut(&str),
    ) -> Result<ArchivosBoletin> {
        progreso(Hito::PreparandoArchivo.mensaje());
        std::fs::create_dir_all(ctx.salida)?;
        let base = format!("{} - {}", identidad.id, nombre_seguro(&identidad.nombre_completo));
        let rutas = ArchivosBoletin {
            documento: ctx.salida.join(format!("{}.docx", base)),
            pdf: ctx.salida.join(format!("{}.pdf", base)),
        };

        progreso(Hito::CalculandoEstadisticas.mensaje());
        let stats = calcular_estadisticas(fila, &self.admin, self.tablas.nota_minima);

        progreso(Hito::PreparandoDatos.mensaje());
        let datos = DatosBoletin {
            nombre_completo: identidad.nombre_completo.clone(),
            id: identidad.id.clone(),
            grado: ctx.grado.to_string(),
            grupo: ctx.grupo.clone(),
            periodo: ctx.periodo.clone(),
            materias_perdidas: stats.materias_perdidas,
            promedio: stats.promedio,
        };
        let reemplazos = construir_reemplazos(&self.tablas.etiquetas, &datos);
        let mapeo = construir_mapeo_areas(&self.mapeo_base, ctx.grado, &self.tablas.exclusiones_por_grado);

        progreso(Hito::GenerandoDocumento.mensaje());
        let archivos = rellenar_documento(
            &self.motor,
            ctx.plantilla,
            &rutas,
            &reemplazos,
            fila,
            &mapeo,
            &self.tablas.titulo_tabla_areas,
            &mut *progreso,
        )?;

        progreso(Hito::Completado.mensaje());
        tracing::info!("✅ Boletín de {} generado: {}", identidad.id, archivos.documento.display());
        Ok(archivos)
    }

    /// Genera los boletines de un grado, uno por fila con estudiante.
    ///
    /// Un fallo de un estudiante se informa y queda en el resumen, y el lote
    /// sigue. Los fallos de configuración o de lectura de la hoja abortan
    /// antes de procesar a nadie. Con `seleccion` solo se generan esos IDs.
    pub fn procesar_grado(
        &self,
        grado: &str,
        periodo: Option<&str>,
        seleccion: Option<&[String]>,
        progreso: Option<&mut dyn FnMut(&str)>,
    ) -> Result<ResumenLote> {
        let mut sin_progreso = |_: &str| {};
        let progreso: &mut dyn FnMut(&str) = match progreso {
            Some(p) => p,
            None => &mut sin_progreso,
        };
        self.procesar_grado_con(grado, periodo, seleccion, progreso)
    }

    fn procesar_grado_con(
        &self,
        grado: &str,
        periodo: Option<&str>,
        seleccion: Option<&[String]>,
        progreso: &mut dyn FnMut(&str),
    ) -> Result<ResumenLote> {
        let plantilla = self.plantilla()?;
        let salida = self.salida()?;
        let hoja = self.leer_grado(grado)?;

        progreso(&format!("📚 Procesando grado: {}", grado));
        let mut resumen = ResumenLote::new(grado);
        let mut vistos: Vec<&str> = Vec::new();

        for fila in &hoja.filas {
            let campo = fila.get(COLUMNA_ESTUDIANTE).unwrap_or("").trim();
            if campo.is_empty() {
                continue;
            }
            let Some(identidad) = parsear_campo_estudiante(campo) else {
                if seleccion.is_none() {
                    progreso(&format!("❌ Error con {}: campo de estudiante inválido", campo));
                    resumen.fallas.push(FallaLote {
                        estudiante: campo.to_string(),
                        tipo: "ParseSkip".to_string(),
                        motivo: format!("Campo de estudiante inválido: '{}'", campo),
                    });
                }
                continue;
            };
            if let Some(ids) = seleccion {
                if !ids.iter().any(|s| s.trim() == identidad.id) {
                    continue;
                }
            }
            vistos.push(campo);

            progreso(&format!("📝 Procesando estudiante: {}", identidad.nombre_completo));
            let ctx = Contexto {
                plantilla,
                salida,
                grado,
                grupo: primero_no_vacio(&[fila.get(COLUMNA_GRUPO)]),
                periodo: primero_no_vacio(&[fila.get(COLUMNA_PERIODO), periodo]),
            };
            match self.generar(fila, &identidad, &ctx, &mut *progreso) {
                Ok(archivos) => resumen.generados.push(archivos),
                Err(e) => {
                    tracing::warn!("⚠️ Error con {}: {}", identidad.nombre_completo, e);
                    progreso(&format!("❌ Error con {}: {}", identidad.nombre_completo, e));
                    resumen.fallas.push(FallaLote {
                        estudiante: campo.to_string(),
                        tipo: e.tipo().to_string(),
                        motivo: e.to_string(),
                    });
                }
            }
        }

        if let Some(ids) = seleccion {
            for id in ids.iter().map(|s| s.trim()) {
                let encontrado = vistos
                    .iter()
                    .any(|campo| parsear_campo_estudiante(campo).is_some_and(|i| i.id == id));
                if !encontrado {
                    let e = NotadorError::EstudianteNoEncontrado {
                        id: id.to_string(),
                        grado: grado.to_string(),
                    };
                    progreso(&format!("❌ Error: {}", e));
                    resumen.fallas.push(FallaLote {
                        estudiante: id.to_string(),
                        tipo: e.tipo().to_string(),
                        motivo: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "📚 Grado {}: {} boletines, {} fallos",
            grado,
            resumen.generados.len(),
            resumen.fallas.len()
        );
        Ok(resumen)
    }

    /// Procesa todas las hojas de grado de la planilla.
    pub fn procesar_todos(
        &self,
        periodo: Option<&str>,
        progreso: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Vec<ResumenLote>> {
        let mut sin_progreso = |_: &str| {};
        let progreso: &mut dyn FnMut(&str) = match progreso {
            Some(p) => p,
            None => &mut sin_progreso,
        };
        let grados = self.grados()?;
        let mut resumenes = Vec::with_capacity(grados.len());
        for grado in &grados {
            resumenes.push(self.procesar_grado_con(grado, periodo, None, &mut *progreso)?);
        }
        Ok(resumenes)
    }

    /// Compara las columnas del grado y los textos de la plantilla con el
    /// mapeo de áreas que se usaría para ese grado.
    pub fn diagnosticar_areas(&self, grado: &str) -> Result<DiagnosticoAreas> {
        let hoja = self.leer_grado(grado)?;
        let mut sesion = self.motor.abrir(self.plantilla()?)?;
        let textos = textos_documento(sesion.documento());
        let mapeo = construir_mapeo_areas(&self.mapeo_base, grado, &self.tablas.exclusiones_por_grado);
        Ok(diagnosticar_areas(&hoja.columnas, &textos, &mapeo, &self.admin))
    }
}

/// Filtra por subcadena (sin distinguir mayúsculas) en ID, nombre o grupo.
/// Un término vacío conserva la lista completa.
pub fn filtrar_estudiantes(lista: &[ResumenEstudiante], termino: &str) -> Vec<ResumenEstudiante> {
    let termino = termino.trim().to_lowercase();
    if termino.is_empty() {
        return lista.to_vec();
    }
    lista
        .iter()
        .filter(|e| {
            e.id.to_lowercase().contains(&termino)
                || e.nombre.to_lowercase().contains(&termino)
                || e.grupo.to_lowercase().contains(&termino)
        })
        .cloned()
        .collect()
}
