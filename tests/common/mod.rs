// Utilidades compartidas por los tests de integración.
#![allow(dead_code)]

use notador::documento::{
    ConvertidorPdf, DocumentoPlantilla, MotorDocumentos, PosicionCelda, SesionDocumento,
};
use notador::{NotadorError, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Documento en memoria: tablas como filas de celdas de texto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentoMemoria {
    pub tablas: Vec<Vec<Vec<String>>>,
    pub parrafos: Vec<String>,
}

impl DocumentoMemoria {
    pub fn new(tablas: &[&[&[&str]]]) -> Self {
        DocumentoMemoria {
            tablas: tablas
                .iter()
                .map(|t| t.iter().map(|f| f.iter().map(|c| c.to_string()).collect()).collect())
                .collect(),
            parrafos: Vec::new(),
        }
    }

    pub fn celda(&self, tabla: usize, fila: usize, columna: usize) -> &str {
        &self.tablas[tabla][fila][columna]
    }
}

impl DocumentoPlantilla for DocumentoMemoria {
    fn num_tablas(&self) -> usize {
        self.tablas.len()
    }

    fn num_filas(&self, tabla: usize) -> usize {
        self.tablas.get(tabla).map(|t| t.len()).unwrap_or(0)
    }

    fn num_celdas(&self, tabla: usize, fila: usize) -> usize {
        self.tablas.get(tabla).and_then(|t| t.get(fila)).map(|f| f.len()).unwrap_or(0)
    }

    fn texto_celda(&self, pos: PosicionCelda) -> Option<String> {
        self.tablas.get(pos.tabla)?.get(pos.fila)?.get(pos.columna).cloned()
    }

    fn escribir_celda(&mut self, pos: PosicionCelda, texto: &str) -> bool {
        match self
            .tablas
            .get_mut(pos.tabla)
            .and_then(|t| t.get_mut(pos.fila))
            .and_then(|f| f.get_mut(pos.columna))
        {
            Some(celda) => {
                *celda = texto.to_string();
                true
            }
            None => false,
        }
    }

    fn textos_parrafos(&self) -> Vec<String> {
        self.parrafos.clone()
    }
}

/// Motor en memoria. Guarda una copia de cada documento escrito y cuenta las
/// sesiones abiertas.
#[derive(Clone, Default)]
pub struct MotorMemoria {
    pub plantilla: DocumentoMemoria,
    pub fallar_pdf: bool,
    pub guardados: Arc<Mutex<Vec<(PathBuf, DocumentoMemoria)>>>,
    pub abiertas: Arc<AtomicUsize>,
}

impl MotorMemoria {
    pub fn new(plantilla: DocumentoMemoria) -> Self {
        MotorMemoria { plantilla, ..Default::default() }
    }

    pub fn guardado(&self, ruta: &Path) -> Option<DocumentoMemoria> {
        let guardados = self.guardados.lock().unwrap();
        guardados.iter().find(|(r, _)| r == ruta).map(|(_, d)| d.clone())
    }

    pub fn sesiones_abiertas(&self) -> usize {
        self.abiertas.load(Ordering::SeqCst)
    }
}

pub struct SesionMemoria {
    documento: DocumentoMemoria,
    fallar_pdf: bool,
    guardados: Arc<Mutex<Vec<(PathBuf, DocumentoMemoria)>>>,
    abiertas: Arc<AtomicUsize>,
}

impl SesionDocumento for SesionMemoria {
    fn documento(&mut self) -> &mut dyn DocumentoPlantilla {
        &mut self.documento
    }

    fn guardar(&mut self, destino: &Path) -> Result<()> {
        std::fs::write(destino, format!("{:?}", self.documento.tablas))?;
        self.guardados.lock().unwrap().push((destino.to_path_buf(), self.documento.clone()));
        Ok(())
    }

    fn exportar_pdf(&mut self, destino: &Path) -> Result<()> {
        if self.fallar_pdf {
            return Err(NotadorError::Motor("conversión a PDF falló".to_string()));
        }
        std::fs::write(destino, b"%PDF-1.4\n")?;
        Ok(())
    }
}

impl Drop for SesionMemoria {
    fn drop(&mut self) {
        self.abiertas.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MotorDocumentos for MotorMemoria {
    fn abrir(&self, _plantilla: &Path) -> Result<Box<dyn SesionDocumento + '_>> {
        self.abiertas.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SesionMemoria {
            documento: self.plantilla.clone(),
            fallar_pdf: self.fallar_pdf,
            guardados: Arc::clone(&self.guardados),
            abiertas: Arc::clone(&self.abiertas),
        }))
    }
}

/// Plantilla de boletín: datos del estudiante, tabla de ÁREAS y resumen.
pub fn plantilla_boletin() -> DocumentoMemoria {
    DocumentoMemoria::new(&[
        &[
            &["NOMBRE Y APELLIDOS COMPLETOS DEL ESTUDIANTE:", "ID INSTITUCIONAL"],
            &["", ""],
            &["GRADO", "", "GRUPO", "", "PERÍODO", ""],
        ],
        &[
            &["ÁREAS", "NOTA"],
            &["Matemáticas", ""],
            &["Humanidades, idioma extranjero (inglés)", ""],
            &["Introducción a la investigación Formativa", ""],
        ],
        &[
            &["Número de áreas o asignaturas con nota no aprobatoria", ""],
            &["Promedio Académico", ""],
        ],
    ])
}

/// Plantilla sin tabla de ÁREAS.
pub fn plantilla_sin_areas() -> DocumentoMemoria {
    DocumentoMemoria::new(&[&[&["GRADO", ""], &["GRUPO", ""]]])
}

/// Conversión falsa: copia el documento como si fuera el PDF.
#[derive(Debug, Clone, Default)]
pub struct CopiaPdf;

impl ConvertidorPdf for CopiaPdf {
    fn convertir(&self, origen: &Path, destino: &Path) -> Result<()> {
        std::fs::copy(origen, destino)?;
        Ok(())
    }
}

/// Escribe un .xlsx con las hojas dadas; la primera fila es el encabezado.
/// Las celdas vacías no se escriben.
pub fn escribir_xlsx(ruta: &Path, hojas: &[(&str, Vec<Vec<&str>>)]) {
    let mut book = umya_spreadsheet::new_file();
    for (i, (nombre, filas)) in hojas.iter().enumerate() {
        let ws = if i == 0 {
            let ws = book.get_sheet_mut(&0).unwrap();
            ws.set_name(*nombre);
            ws
        } else {
            book.new_sheet(*nombre).unwrap()
        };
        for (r, fila) in filas.iter().enumerate() {
            for (c, valor) in fila.iter().enumerate() {
                if !valor.is_empty() {
                    ws.get_cell_mut(((c + 1) as u32, (r + 1) as u32)).set_value(*valor);
                }
            }
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, ruta).expect("Debe escribir el xlsx de prueba");
}

/// Planilla típica: grados 7 y 8 más la pestaña consolidado.
pub fn planilla_grados(ruta: &Path) {
    let encabezado = vec!["ESTUDIANTE", "GRUPO", "PERIODO", "Matemáticas", "Inglés", "Investigación"];
    escribir_xlsx(
        ruta,
        &[
            (
                "7",
                vec![
                    encabezado.clone(),
                    vec!["123456789 - PEREZ GOMEZ ANA MARIA", "A", "1", "4,5", "3,0", "4"],
                    vec!["12345 - MAL FORMADO", "A", "1", "3", "3", "3"],
                    vec!["987654321 - RUIZ DIAZ LUIS", "", "", "2", "4", "5"],
                ],
            ),
            (
                "8",
                vec![
                    encabezado.clone(),
                    vec!["111222333 - LOPEZ MORA CARLOS", "B", "2", "4", "4", "2"],
                ],
            ),
            ("consolidado", vec![vec!["RESUMEN"], vec!["nada"]]),
        ],
    );
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub fn parrafo_xml(texto: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, texto)
}

pub fn tabla_xml(filas: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>");
    for fila in filas {
        xml.push_str("<w:tr>");
        for celda in *fila {
            xml.push_str("<w:tc><w:tcPr><w:tcW w:w=\"2000\" w:type=\"dxa\"/></w:tcPr>");
            xml.push_str(&parrafo_xml(celda));
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// Escribe un .docx mínimo con el cuerpo dado.
pub fn escribir_docx(ruta: &Path, cuerpo: &str) {
    let documento = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>{}<w:sectPr/></w:body></w:document>"#
        ),
        cuerpo
    );
    let file = File::create(ruta).unwrap();
    let mut zip = ZipWriter::new(file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (nombre, contenido) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", documento.as_str()),
    ] {
        zip.start_file(nombre, opts).unwrap();
        zip.write_all(contenido.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Plantilla DOCX equivalente a `plantilla_boletin`, con un párrafo de título.
pub fn docx_boletin(ruta: &Path) {
    let cuerpo = [
        parrafo_xml("BOLETÍN ACADÉMICO"),
        tabla_xml(&[
            &["NOMBRE Y APELLIDOS COMPLETOS DEL ESTUDIANTE:", "ID INSTITUCIONAL"],
            &["", ""],
            &["GRADO", "", "GRUPO", "", "PERÍODO", ""],
        ]),
        tabla_xml(&[
            &["ÁREAS", "NOTA"],
            &["Matemáticas", ""],
            &["Humanidades, idioma extranjero (inglés)", ""],
            &["Introducción a la investigación Formativa", ""],
        ]),
        tabla_xml(&[
            &["Número de áreas o asignaturas con nota no aprobatoria", ""],
            &["Promedio Académico", ""],
        ]),
    ]
    .concat();
    escribir_docx(ruta, &cuerpo);
}
